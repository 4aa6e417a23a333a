use null_chain::handlers::collector::FailureCollector;
use null_chain::handlers::logging::FailureLogger;
use null_chain::{Chain, StepFailure};
use std::collections::HashMap;

// ============================================================================
// DOMAIN
// ============================================================================

#[derive(Debug, Clone)]
struct User {
    id: u32,
    team: Option<String>,
}

#[derive(Debug, Clone)]
struct Team {
    name: String,
    channel: String,
}

struct Directory {
    users: HashMap<u32, User>,
    teams: HashMap<String, Team>,
    offline_ids: Vec<u32>,
}

impl Directory {
    fn sample() -> Self {
        let users = [
            User { id: 1, team: Some("core".into()) },
            User { id: 2, team: None },
            User { id: 3, team: Some("kernel".into()) },
            User { id: 4, team: Some("infra".into()) },
        ];
        let teams = [
            Team { name: "core".into(), channel: "#core".into() },
            Team { name: "infra".into(), channel: "#infra".into() },
        ];

        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            teams: teams.into_iter().map(|t| (t.name.clone(), t)).collect(),
            offline_ids: vec![4],
        }
    }

    fn find_user(&self, id: u32) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn find_team(&self, user: &User) -> Result<Option<Team>, String> {
        if self.offline_ids.contains(&user.id) {
            return Err(format!("team service unavailable for user {}", user.id));
        }
        Ok(user.team.as_ref().and_then(|name| self.teams.get(name).cloned()))
    }

    fn default_channel(&self) -> Option<String> {
        Some("#general".to_string())
    }
}

// ============================================================================
// LOOKUPS
// ============================================================================

/// Team channel for user `id`, or the default channel.
fn notification_channel(directory: &Directory, id: u32, failures: &FailureCollector) -> String {
    let record = failures.handler();
    let logger = FailureLogger::warn().with_message("team lookup failed");

    Chain::from_fn(|| directory.find_user(id))
        .with_global_error_fallback(move |failure: &StepFailure| {
            logger.log(failure);
            record(failure);
        })
        .with_error_fallback(|failure| println!("   [FALLBACK] {failure}"))
        .try_then(|user| directory.find_team(&user))
        .map(|team| team.channel)
        .or_else_with(|| directory.default_channel())
        .unwrap_or(String::new())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let directory = Directory::sample();
    let failures = FailureCollector::new();

    println!("=== Notification channels ===");
    for id in 1..=5 {
        let channel = notification_channel(&directory, id, &failures);
        println!("   user {id} -> {channel}");
    }

    println!("\n=== Failures seen ===");
    for record in failures.records() {
        println!(
            "   {} at position {} (panicked: {}): {}",
            record.stage, record.position, record.panicked, record.message
        );
    }
}
