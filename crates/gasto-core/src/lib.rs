//! Gasto Recorrente Core Library
//!
//! Shared functionality for the Gasto Recorrente subscription detector:
//! - Statement text normalization and the fixed extraction prompt
//! - Hosted AI provider adapters (Gemini, Groq, OpenRouter) with a
//!   sequential fallback orchestrator
//! - Result normalization into the canonical analysis report
//! - Fixed-window rate limiting for the public endpoints
//! - Payment-return gatekeeping with a webhook confirmation ledger
//! - PIX billing dispatch (Woovi, AbacatePay) with provider fallback
//! - Cancellation-alternatives catalog and the demo report

pub mod ai;
pub mod alternatives;
pub mod analysis;
pub mod billing;
pub mod demo;
pub mod error;
pub mod models;
pub mod paywall;
pub mod prompt;
pub mod ratelimit;
pub mod text;

pub use ai::{
    ExtractError, Extraction, FallbackOrchestrator, GeminiBackend, GroqBackend, MockBackend,
    OpenRouterBackend, ProviderBackend, ProviderClient, ProviderError,
};
pub use alternatives::{Alternative, AlternativeKind};
pub use analysis::{aggregate, map_category, normalize_items};
pub use billing::{
    AbacatePayBackend, BillingDispatcher, BillingError, ChargeDescriptor, ChargeRequest,
    MockPaymentBackend, PaymentClient, PaymentProvider, WooviBackend, CHARGE_VALUE_CENTAVOS,
};
pub use demo::demo_report;
pub use error::{Error, Result};
pub use models::{AnalysisResult, Category, ExtractionReply, RawSubscription, SubscriptionItem};
pub use paywall::{
    ConfirmationLedger, ConfirmedCharge, PaymentReturn, PaywallGate, PendingPaymentMarker,
    RejectReason, ReturnOutcome, MARKER_TTL,
};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use ratelimit::{CounterStore, MemoryStore, RateLimitConfig, RateLimitInfo, RateLimiter};
pub use text::normalize;
