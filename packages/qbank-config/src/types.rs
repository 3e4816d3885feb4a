use serde::{Deserialize, Serialize};

/// Hard ceiling on candidate search results, regardless of configuration.
pub const SEARCH_LIMIT_CAP: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub groups: Groups,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Used when a request omits `limit` or passes zero.
	pub default_limit: u32,
	pub max_limit: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_limit: 5, max_limit: SEARCH_LIMIT_CAP }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Groups {
	pub delete_policy: DeletePolicy,
	/// Extra attempts for a transition that lost a serialization or deadlock race.
	pub conflict_retries: u32,
}
impl Default for Groups {
	fn default() -> Self {
		Self { delete_policy: DeletePolicy::Dissolve, conflict_retries: 3 }
	}
}

/// What happens to the variations of a canonical question that is being deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
	/// Every variation becomes its own singleton group.
	#[default]
	Dissolve,
	/// The oldest variation becomes the canonical and the rest follow it.
	PromoteOldest,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}
