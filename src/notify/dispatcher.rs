use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use uuid::Uuid;

use crate::database::Database;
use crate::models::{ephemeral, set_notif_status, DeliveryStatus, EphemeralKind};
use crate::notify::{audience, Recipient, Selector};

/// Пауза между отправками менеджерской рассылки — держит нас под
/// потолком исходящих сообщений платформы.
pub const MANAGER_PACE: Duration = Duration::from_millis(34);
/// Плановые напоминания не спешат.
pub const REMINDER_PACE: Duration = Duration::from_secs(1);

/// Кнопка под сообщением кампании (например «Оценить»).
#[derive(Debug, Clone)]
pub struct CampaignButton {
    pub label: String,
    pub callback: String,
}

/// Шов к чат-транспорту: в проде — Telegram, в тестах — мок.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(
        &self,
        chat_id: i64,
        text: &str,
        button: Option<&CampaignButton>,
    ) -> Result<i32, String>;
}

pub struct TelegramTransport {
    pub bot: Bot,
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn deliver(
        &self,
        chat_id: i64,
        text: &str,
        button: Option<&CampaignButton>,
    ) -> Result<i32, String> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(button) = button {
            request = request.reply_markup(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback(button.label.clone(), button.callback.clone()),
            ]]));
        }

        match request.await {
            Ok(message) => Ok(message.id.0),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FanOutReport {
    pub delivered: u32,
    pub total: u32,
    /// (chat_id, message_id) успешных отправок — для учёта на удаление.
    pub sent: Vec<(i64, i32)>,
}

impl FanOutReport {
    pub fn all_delivered(&self) -> bool {
        self.total > 0 && self.delivered == self.total
    }
}

/// Веер по снимку получателей. Ошибка одного получателя логируется и
/// не прерывает остальных; повторов нет — каждая кампания независима.
pub async fn fan_out(
    transport: &dyn Transport,
    recipients: &[Recipient],
    text: &str,
    button: Option<&CampaignButton>,
    pace: Duration,
) -> FanOutReport {
    let mut report = FanOutReport {
        total: recipients.len() as u32,
        ..Default::default()
    };

    for recipient in recipients {
        match transport.deliver(recipient.chat_id, text, button).await {
            Ok(message_id) => {
                report.delivered += 1;
                report.sent.push((recipient.chat_id, message_id));
            }
            Err(e) => {
                log::warn!("delivery to chat {} failed: {}", recipient.chat_id, e);
            }
        }
        tokio::time::sleep(pace).await;
    }

    report
}

/// Полный цикл кампании: снимок аудитории, веер, учёт отправленных
/// сообщений, агрегатный статус целевой сущности.
pub async fn run_campaign(
    db: &Database,
    transport: &dyn Transport,
    selector: &Selector,
    text: &str,
    button: Option<&CampaignButton>,
    kind: EphemeralKind,
    pace: Duration,
) -> sqlx::Result<FanOutReport> {
    let campaign_id = Uuid::new_v4();
    let recipients = audience::resolve(db, selector).await?;
    log::info!(
        "campaign {}: {:?}, {} recipients",
        campaign_id,
        selector,
        recipients.len()
    );

    let report = fan_out(transport, &recipients, text, button, pace).await;

    for (chat_id, message_id) in &report.sent {
        ephemeral::track(db, ChatId(*chat_id), MessageId(*message_id), kind).await?;
    }

    if let Some((table, id)) = selector.status_target() {
        let status = if report.all_delivered() {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        };
        set_notif_status(db, table, id, status).await?;
    }

    log::info!(
        "campaign {}: delivered {}/{}",
        campaign_id,
        report.delivered,
        report.total
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Мок: падает на заданных получателях, помнит порядок попыток.
    struct FlakyTransport {
        fail_for: Vec<i64>,
        attempts: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn deliver(
            &self,
            chat_id: i64,
            _text: &str,
            _button: Option<&CampaignButton>,
        ) -> Result<i32, String> {
            self.attempts.lock().unwrap().push(chat_id);
            if self.fail_for.contains(&chat_id) {
                Err("blocked by user".to_string())
            } else {
                Ok(chat_id as i32)
            }
        }
    }

    fn recipients(ids: &[i64]) -> Vec<Recipient> {
        ids.iter().map(|&chat_id| Recipient { chat_id }).collect()
    }

    #[tokio::test]
    async fn failure_in_the_middle_does_not_abort_the_rest() {
        let transport = FlakyTransport {
            fail_for: vec![3],
            attempts: Mutex::new(Vec::new()),
        };
        let audience = recipients(&[1, 2, 3, 4, 5]);

        let report = fan_out(&transport, &audience, "привет", None, Duration::ZERO).await;

        assert_eq!(report.delivered, 4);
        assert_eq!(report.total, 5);
        assert!(!report.all_delivered());
        // все получатели после сбойного тоже получили попытку
        assert_eq!(*transport.attempts.lock().unwrap(), vec![1, 2, 3, 4, 5]);
        let sent_chats: Vec<i64> = report.sent.iter().map(|(c, _)| *c).collect();
        assert_eq!(sent_chats, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn empty_audience_never_counts_as_fully_delivered() {
        let transport = FlakyTransport {
            fail_for: vec![],
            attempts: Mutex::new(Vec::new()),
        };

        let report = fan_out(&transport, &[], "привет", None, Duration::ZERO).await;
        assert_eq!(report.delivered, 0);
        assert!(!report.all_delivered());
    }

    #[test]
    fn aggregate_status_only_for_entity_campaigns() {
        use crate::models::{Role, StatusTable};

        assert_eq!(
            Selector::Event(5).status_target(),
            Some((StatusTable::Events, 5))
        );
        assert_eq!(
            Selector::Consultation(2).status_target(),
            Some((StatusTable::ConsultationSlots, 2))
        );
        assert_eq!(Selector::Roles(vec![Role::User]).status_target(), None);
        assert_eq!(Selector::Person(9).status_target(), None);
    }
}
