use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use companion_agents::{Collaborators, CompanionAgent};
use companion_core::{
    mood::daily_quote, mood_emoji, normalize_text, route_message, BookingItem, BookingState,
    ChatInput, MoodAnswers, PassengerDetails, MOOD_QUESTIONS,
};
use companion_observability::{init_tracing, AppMetrics};
use companion_storage::Store;

#[derive(Debug, Parser)]
#[command(name = "companion")]
#[command(about = "Student Companion CLI")]
struct Cli {
    #[arg(long, env = "COMPANION_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score a mood questionnaire (six answers from 1 to 5).
    Mood {
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        answers: Option<Vec<u8>>,
        #[arg(long)]
        uid: Option<String>,
    },
    /// Show the latest mood entry and recent history for a user.
    History {
        #[arg(long)]
        uid: String,
    },
    Intent {
        text: String,
    },
    Chat,
    Flights {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        date: Option<String>,
    },
    Hotels {
        #[arg(long)]
        city: Option<String>,
    },
    /// Run a booking through review, the countdown and confirmation.
    Book(BookArgs),
}

#[derive(Debug, Args)]
struct BookArgs {
    /// Index into the hotel listing for `--city`. The first hotel is booked
    /// when neither `--hotel` nor `--flight` is given.
    #[arg(long, conflicts_with = "flight")]
    hotel: Option<usize>,
    #[arg(long, conflicts_with = "flight")]
    city: Option<String>,
    /// Index into the flight search results for `--from`/`--to`.
    #[arg(long, requires_all = ["from", "to"])]
    flight: Option<usize>,
    #[arg(long, requires = "flight")]
    from: Option<String>,
    #[arg(long, requires = "flight")]
    to: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long, default_value = "male")]
    gender: String,
    #[arg(long, default_value = "veg")]
    meal: String,
    #[arg(long)]
    date: Option<String>,
    #[arg(
        long,
        default_value_t = 1000,
        env = "COMPANION_BOOKING_TICK_MILLIS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    tick_millis: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("companion_cli");
    let cli = Cli::parse();

    let agent = build_agent(cli.database_url.as_deref()).await?;

    match cli.command {
        Command::Mood { answers, uid } => {
            let answers = match answers {
                Some(values) => MoodAnswers::from_slice(&values)?,
                None => prompt_answers()?,
            };
            let result = agent.submit_mood_check(uid.as_deref(), answers).await;

            println!("{} {}", mood_emoji(result.label.as_str()), result.label.as_str());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::History { uid } => {
            match agent.latest_mood(&uid).await? {
                Some(latest) => println!(
                    "latest: {} {} ({:.2}) at {}",
                    latest.emoji,
                    latest.record.mood_label,
                    latest.record.mood_score,
                    latest.record.timestamp
                ),
                None => println!("no mood entries for {}", uid),
            }
            let history = agent.mood_history(&uid).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
            println!("\n\"{}\"", daily_quote(chrono::Utc::now().timestamp() as usize / 86_400));
        }
        Command::Intent { text } => {
            let (intent, route) = route_message(&normalize_text(&text));
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "intent": intent,
                    "parameter": route.parameter(),
                }))?
            );
        }
        Command::Chat => run_chat(&agent).await?,
        Command::Flights { from, to, date } => {
            let flights = agent.search_flights(&from, &to, date.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&flights)?);
        }
        Command::Hotels { city } => {
            let hotels = agent.fetch_hotels(city.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&hotels)?);
        }
        Command::Book(args) => run_booking(&agent, args).await?,
    }

    Ok(())
}

async fn build_agent(database_url: Option<&str>) -> Result<CompanionAgent<Store>> {
    let store = match database_url {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };

    Ok(CompanionAgent::new(
        Arc::new(store),
        Collaborators::offline(),
        AppMetrics::shared(),
    ))
}

fn prompt_answers() -> Result<MoodAnswers> {
    let mut answers = MoodAnswers::default();

    for (index, question) in MOOD_QUESTIONS.iter().enumerate() {
        print!("{} [1-5, default 3]: ", question);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: u8 = line
            .parse()
            .with_context(|| format!("'{}' is not a number", line))?;
        answers.set(index, value)?;
    }

    Ok(answers)
}

async fn run_chat(agent: &CompanionAgent<Store>) -> Result<()> {
    println!("Student Companion chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent
            .handle_chat(ChatInput {
                text: message.to_string(),
                user_id: None,
            })
            .await?;

        println!("\n{}\n", reply.reply_text);

        for video in &reply.videos {
            println!("- {} ({})", video.title, video.url);
        }
        for place in &reply.places {
            println!("- {}: {}", place.name, place.maps_url);
        }
        if !reply.videos.is_empty() || !reply.places.is_empty() {
            println!();
        }
    }

    Ok(())
}

async fn pick_item(agent: &CompanionAgent<Store>, args: &BookArgs) -> Result<BookingItem> {
    if let Some(index) = args.flight {
        let from = args.from.as_deref().unwrap_or_default();
        let to = args.to.as_deref().unwrap_or_default();
        let flights = agent.search_flights(from, to, args.date.as_deref()).await?;
        let Some(flight) = flights.into_iter().nth(index) else {
            bail!("no flight at index {}", index);
        };
        return Ok(BookingItem::Flight(flight));
    }

    let index = args.hotel.unwrap_or_default();
    let hotels = agent.fetch_hotels(args.city.as_deref()).await?;
    let Some(hotel) = hotels.into_iter().nth(index) else {
        bail!("no hotel at index {}", index);
    };
    Ok(BookingItem::Hotel(hotel))
}

async fn run_booking(agent: &CompanionAgent<Store>, args: BookArgs) -> Result<()> {
    let item = pick_item(agent, &args).await?;

    let agent = agent.clone().with_booking_tick(Duration::from_millis(args.tick_millis));
    let session = agent.new_booking_session();

    let snapshot = session.open(item)?;
    if let Some(pricing) = snapshot.pricing {
        println!(
            "reviewing booking {}: price {} + taxes {} = {}",
            session.id(),
            pricing.price,
            pricing.taxes,
            pricing.total
        );
    }

    session.update_passenger(PassengerDetails {
        name: args.name.unwrap_or_default(),
        age: args.age.unwrap_or_default(),
        gender: args.gender,
        meal_preference: args.meal,
        email: args.email.unwrap_or_default(),
        phone: args.phone.unwrap_or_default(),
        date: args.date,
    })?;

    if let Err(err) = session.process() {
        session.close();
        bail!("{}", err);
    }

    let mut states = session.subscribe();
    let mut ticker = tokio::time::interval(session.tick());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                println!("confirming in {}s", session.snapshot().timer);
            }
            changed = states.changed() => {
                changed.context("booking session ended")?;
                if *states.borrow_and_update() == BookingState::Success {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                session.close();
                println!("booking cancelled");
                return Ok(());
            }
        }
    }

    let snapshot = session.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot.boarding_pass)?);
    Ok(())
}
