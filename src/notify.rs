//! Notification templates and simulated dispatch
//!
//! Templates carry `{placeholder}` tokens filled from caller data. Delivery
//! goes through a [`ChannelSink`]; the default sink only logs.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Dispatch records kept in memory
pub const SENT_LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PackageCreated,
    InTransit,
    Delivered,
    Delayed,
}

/// Title and body with `{placeholder}` tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub title: &'static str,
    pub body: &'static str,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::PackageCreated => "package_created",
            NotificationKind::InTransit => "in_transit",
            NotificationKind::Delivered => "delivered",
            NotificationKind::Delayed => "delayed",
        }
    }

    pub fn template(&self) -> Template {
        match self {
            NotificationKind::PackageCreated => Template {
                title: "Paquete Registrado",
                body: "Tu paquete {codigo} ha sido registrado exitosamente. Seguimiento disponible en: {link}",
            },
            NotificationKind::InTransit => Template {
                title: "Paquete en Tránsito",
                body: "Tu paquete {codigo} está en camino a {destino}. ETA: {eta}",
            },
            NotificationKind::Delivered => Template {
                title: "Paquete Entregado",
                body: "Tu paquete {codigo} ha sido entregado exitosamente a {destinatario}",
            },
            NotificationKind::Delayed => Template {
                title: "Retraso en Entrega",
                body: "Tu paquete {codigo} presenta un retraso. Nueva fecha estimada: {nueva_fecha}",
            },
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "package_created" | "paquete_creado" => Ok(NotificationKind::PackageCreated),
            "in_transit" | "en_transito" => Ok(NotificationKind::InTransit),
            "delivered" | "entregado" => Ok(NotificationKind::Delivered),
            "delayed" | "retraso" => Ok(NotificationKind::Delayed),
            other => Err(AppError::InvalidInput(format!(
                "Unknown notification type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
    Whatsapp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
            Channel::Whatsapp => "whatsapp",
        }
    }

    /// Data key holding this channel's address
    fn recipient<'a>(&self, data: &'a BTreeMap<String, String>) -> Option<&'a str> {
        let lookup = |key: &str| data.get(key).map(String::as_str).filter(|v| !v.is_empty());
        match self {
            Channel::Email => lookup("email"),
            Channel::Sms | Channel::Whatsapp => lookup("telefono").or_else(|| lookup("phone")),
            Channel::Push => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            "whatsapp" => Ok(Channel::Whatsapp),
            other => Err(AppError::InvalidInput(format!("Unknown channel: {}", other))),
        }
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"))
}

/// Replace `{key}` with `data[key]`; missing or empty values leave the token as is
pub fn render_template(template: &str, data: &BTreeMap<String, String>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| {
            match data.get(&caps[1]).filter(|v| !v.is_empty()) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Where rendered notifications are delivered
pub trait ChannelSink: Send + Sync {
    fn deliver(
        &self,
        channel: Channel,
        recipient: Option<&str>,
        title: &str,
        body: &str,
    ) -> Result<(), AppError>;
}

/// Sink that only logs, standing in for the real email/SMS/push/WhatsApp providers
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ChannelSink for LogSink {
    fn deliver(
        &self,
        channel: Channel,
        recipient: Option<&str>,
        title: &str,
        body: &str,
    ) -> Result<(), AppError> {
        info!(
            channel = channel.as_str(),
            recipient = recipient.unwrap_or("-"),
            "{} - {}",
            title,
            body
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Sent,
    PartiallySent,
    Failed,
}

/// What was sent, to whom and through which channels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: NotificationKind,
    pub recipient: Option<String>,
    pub channels: Vec<Channel>,
    pub failed_channels: Vec<Channel>,
    pub title: String,
    pub body: String,
    pub status: DispatchStatus,
}

pub struct Notifier {
    sink: Box<dyn ChannelSink>,
    sent: VecDeque<DispatchRecord>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Box::new(LogSink))
    }
}

impl Notifier {
    pub fn new(sink: Box<dyn ChannelSink>) -> Self {
        Self {
            sink,
            sent: VecDeque::new(),
        }
    }

    /// Render `kind` with `data` and deliver it on every channel
    ///
    /// No channels means email only.
    pub fn send(
        &mut self,
        kind: NotificationKind,
        data: &BTreeMap<String, String>,
        channels: &[Channel],
    ) -> DispatchRecord {
        let channels: Vec<Channel> = if channels.is_empty() {
            vec![Channel::Email]
        } else {
            channels.to_vec()
        };

        let template = kind.template();
        let title = render_template(template.title, data);
        let body = render_template(template.body, data);

        let mut failed_channels = Vec::new();
        for channel in &channels {
            let recipient = channel.recipient(data);
            if recipient.is_none() && *channel != Channel::Push {
                warn!("No recipient for {} notification over {}", kind, channel);
            }
            if let Err(e) = self.sink.deliver(*channel, recipient, &title, &body) {
                warn!("Delivery of {} over {} failed: {}", kind, channel, e);
                failed_channels.push(*channel);
            }
        }

        let status = if failed_channels.is_empty() {
            DispatchStatus::Sent
        } else if failed_channels.len() == channels.len() {
            DispatchStatus::Failed
        } else {
            DispatchStatus::PartiallySent
        };

        let recipient = Channel::Email
            .recipient(data)
            .or_else(|| Channel::Sms.recipient(data))
            .map(str::to_string);

        let record = DispatchRecord {
            timestamp: Utc::now(),
            kind,
            recipient,
            channels,
            failed_channels,
            title,
            body,
            status,
        };

        self.sent.push_back(record.clone());
        while self.sent.len() > SENT_LOG_CAPACITY {
            self.sent.pop_front();
        }
        record
    }

    /// Most recent dispatches, oldest first
    pub fn sent(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.sent.iter()
    }
}
