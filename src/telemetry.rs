use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref QUESTIONS_CREATED: IntCounter = register_int_counter!(
        "trivia_questions_created_total",
        "Number of questions created"
    )
    .unwrap();
    pub static ref QUESTIONS_DELETED: IntCounter = register_int_counter!(
        "trivia_questions_deleted_total",
        "Number of questions deleted"
    )
    .unwrap();
    pub static ref QUIZ_QUESTIONS_SERVED: IntCounterVec = register_int_counter_vec!(
        "trivia_quiz_questions_served_total",
        "Number of questions handed out while playing a quiz",
        &["category"]
    )
    .unwrap();
}

const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
const SPAN_EVENTS_VAR: &str = "INCLUDE_SPAN_EVENTS";

/// Span enter/exit events are logged only when explicitly switched on.
fn span_events(flag: Option<&str>) -> FmtSpan {
    match flag {
        Some(value) if value.eq_ignore_ascii_case("true") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::NONE,
    }
}

/// Installs the global subscriber. `LOG_LEVEL` takes `EnvFilter` directives
/// (e.g. `info,sqlx=warn`); invalid directives are skipped and the level
/// defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_LEVEL_VAR)
        .from_env_lossy();
    let flag = std::env::var(SPAN_EVENTS_VAR).ok();
    let fmt_layer = fmt::layer().with_span_events(span_events(flag.as_deref()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
