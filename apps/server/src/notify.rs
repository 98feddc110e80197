//! # Restock Notification Dispatch
//!
//! When an out-of-stock medicine comes back, every pending waitlist entry
//! gets a WhatsApp message. Dispatch is behind the [`WhatsAppSender`] trait
//! so the gateway can be swapped (and faked in tests).
//!
//! ## Partial Failure
//! Sends are independent: one undeliverable number never blocks the rest.
//! Only successful sends mark their entry notified and leave an audit
//! notification; failures are logged and the entry stays pending for the
//! next restock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use apotek_core::phone::restock_message;
use apotek_core::types::{MedicineStock, NotificationKind};
use apotek_db::{Database, DbResult, NewNotification, PendingWaiter};

/// Outbound WhatsApp gateway.
#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    /// Sends one message; `false` means delivery failed.
    async fn send(&self, phone: &str, message: &str) -> bool;
}

/// Default sender: logs the message instead of dispatching it. Stands in
/// until a real gateway (Twilio, WhatsApp Business API) is wired up.
#[derive(Debug, Default)]
pub struct ConsoleSender;

#[async_trait]
impl WhatsAppSender for ConsoleSender {
    async fn send(&self, phone: &str, message: &str) -> bool {
        info!(phone, chars = message.len(), "WhatsApp message (console sender)");
        true
    }
}

/// What one restock sweep did.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RestockReport {
    /// Entries messaged and marked notified.
    pub notified: usize,
    /// Entries left pending: delivery failed or no WhatsApp number on file.
    pub failed: usize,
}

/// Messages one waiter. Returns whether the message went out; only then is
/// the entry marked notified and an audit row written.
async fn dispatch(
    db: &Database,
    sender: &Arc<dyn WhatsAppSender>,
    medicine: &MedicineStock,
    waiter: &PendingWaiter,
) -> DbResult<bool> {
    let Some(phone) = waiter.customer_whatsapp.as_deref() else {
        warn!(
            customer = %waiter.customer_name,
            medicine = %medicine.medicine.name,
            "Waiter has no WhatsApp number, left pending"
        );
        return Ok(false);
    };

    let message = restock_message(
        &waiter.customer_name,
        &medicine.medicine.name,
        medicine.total_quantity,
        &medicine.medicine.unit,
        &waiter.entry.created_at.format("%d/%m/%Y").to_string(),
    );

    if !sender.send(phone, &message).await {
        warn!(
            customer = %waiter.customer_name,
            phone,
            "WhatsApp send failed, entry left pending"
        );
        return Ok(false);
    }

    db.waitlist().mark_notified(waiter.entry.id).await?;
    db.notifications()
        .insert(NewNotification {
            title: format!("Restock: {}", medicine.medicine.name),
            message: format!(
                "{} diberi tahu via WhatsApp ({})",
                waiter.customer_name,
                Utc::now().format("%d/%m/%Y %H:%M")
            ),
            kind: NotificationKind::CustomerNotification,
            priority: None,
            customer_id: Some(waiter.entry.customer_id),
            medicine_id: Some(waiter.entry.medicine_id),
        })
        .await?;
    Ok(true)
}

/// Messages every pending waiter for one medicine.
pub async fn notify_waitlist(
    db: &Database,
    sender: &Arc<dyn WhatsAppSender>,
    medicine_id: i64,
) -> DbResult<RestockReport> {
    let medicine = db.medicines().get(medicine_id).await?;
    let pending = db.waitlist().pending_for_medicine(medicine_id).await?;

    let mut report = RestockReport::default();
    for waiter in pending {
        if dispatch(db, sender, &medicine, &waiter).await? {
            report.notified += 1;
        } else {
            report.failed += 1;
        }
    }

    info!(
        medicine = %medicine.medicine.name,
        notified = report.notified,
        failed = report.failed,
        "Restock sweep complete"
    );
    Ok(report)
}

/// Messages a single waiter, fetched by waitlist entry id.
pub async fn notify_waiter(
    db: &Database,
    sender: &Arc<dyn WhatsAppSender>,
    waiter: &PendingWaiter,
) -> DbResult<bool> {
    let medicine = db.medicines().get(waiter.entry.medicine_id).await?;
    dispatch(db, sender, &medicine, waiter).await
}
