// Audit Logger
//
// Records who changed what in the rental catalog.
// Sinks never fail the operation they describe; delivery problems stay inside the sink.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Mutex;

/// Kind of audited change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BookingCreated,
    BookingRejected,
    BookingUpdated,
    BookingCancelled,
    BookingDeleted,
    BookingCompleted,
    VehicleAdded,
    VehicleUpdated,
    VehicleDeleted,
    CustomerRegistered,
    CustomerUpdated,
    CustomerDeleted,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::BookingCreated => "booking_created",
            AuditAction::BookingRejected => "booking_rejected",
            AuditAction::BookingUpdated => "booking_updated",
            AuditAction::BookingCancelled => "booking_cancelled",
            AuditAction::BookingDeleted => "booking_deleted",
            AuditAction::BookingCompleted => "booking_completed",
            AuditAction::VehicleAdded => "vehicle_added",
            AuditAction::VehicleUpdated => "vehicle_updated",
            AuditAction::VehicleDeleted => "vehicle_deleted",
            AuditAction::CustomerRegistered => "customer_registered",
            AuditAction::CustomerUpdated => "customer_updated",
            AuditAction::CustomerDeleted => "customer_deleted",
        };
        f.write_str(name)
    }
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    /// Username of the caller
    pub actor: String,
    /// Key of the booking, vehicle or customer affected
    pub subject_id: String,
    pub details: JsonValue,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        actor: impl Into<String>,
        subject_id: impl Into<String>,
        details: JsonValue,
    ) -> Self {
        Self {
            action,
            actor: actor.into(),
            subject_id: subject_id.into(),
            details,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits each event as a structured `tracing` event on the `audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            action = %event.action,
            actor = %event.actor,
            subject = %event.subject_id,
            details = %event.details,
            timestamp = %event.timestamp.to_rfc3339(),
            "audit event"
        );
    }
}

/// Keeps events in memory so callers can inspect them
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.events().iter().map(|event| event.action).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(e) => tracing::error!("Failed to record audit event: {}", e),
        }
    }
}
