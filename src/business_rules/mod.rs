// Business Rules System Module
//
// Rule engines behind the rental API:
// - Availability: booking notice periods, overlap detection, change windows
// - Pricing: per-category rates, long-rental discount, distance charges, tax
// - Search: vehicle and booking filters, best matches, recommendations
// Audit events and per-operation timings are recorded alongside.

pub mod error;
pub mod types;
pub mod availability;
pub mod pricing;
pub mod search;
pub mod audit;
pub mod handlers;
pub mod metrics;

// Re-export commonly used types for convenience
pub use error::{BusinessRulesError, BRResult};
pub use types::{VehicleCategory, VehicleStatus};
pub use availability::{AvailabilityEngine, BookingValidationResult};
pub use pricing::{ChargeBreakdown, FeeCalculator, Invoice, PricingRule, PricingTable};
pub use search::{
    BestMatch,
    BookingSearchCriteria,
    Recommendation,
    SearchEngine,
    VehicleSearchCriteria,
};
pub use audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use metrics::{OperationType, PerformanceMetrics};
