// Receipt Processor - Core Library
// Exposes the scoring engine, stores and HTTP router for the server and tests

pub mod api;
pub mod config;
pub mod model;
pub mod rules;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use api::{router, ApiError, AppState};
pub use config::ServerConfig;
pub use model::{
    Item, ItemPayload, PointsResponse, ProcessResponse, Receipt, ReceiptPayload,
    ValidationError,
};
pub use rules::{
    calculate_afternoon_purchase_points, calculate_item_count_points,
    calculate_item_description_points, calculate_odd_day_points, calculate_points,
    calculate_quarter_multiple_points, calculate_retailer_points, calculate_round_total_points,
    score, PointsBreakdown, ScoringError,
};
pub use service::{ReceiptService, ScoringTask, ServiceError, Submission};
pub use store::{MemoryPointsCache, MemoryReceiptStore, PointsCache, ReceiptStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
