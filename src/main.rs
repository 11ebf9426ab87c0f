use std::env;

use teloxide::{prelude::*, utils::command::BotCommands};

mod booking;
mod bot_state;
mod clock;
mod database;
mod handlers;
mod models;
mod notify;
mod scheduler;

use crate::bot_state::BotState;
use crate::database::Database;
use crate::handlers::{callback_handler, command_handler, message_handler};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать помощь")]
    Help,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting event assistant bot with PostgreSQL...");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let db = Database::new(&database_url).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    let state = BotState::new(db);
    let bot = Bot::from_env();

    // Фоновая задача: напоминания и чистка сообщений по расписанию
    let scheduler_bot = bot.clone();
    let scheduler_state = state.clone();
    tokio::spawn(async move {
        scheduler::scheduler_task(scheduler_bot, scheduler_state).await;
    });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
