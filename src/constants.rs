// -
// Fast-store key namespaces
//
// Every key this system writes to the shared cache carries the `tally:`
// prefix so shutdown-drain can purge exactly our keys and nothing else.

/// Root namespace for all keys owned by this system
pub(crate) const KEY_NAMESPACE: &str = "tally:";

/// Unreconciled vote deltas: `tally:votes:<participant>` -> i64
pub(crate) const VOTES_DELTA_PREFIX: &str = "tally:votes:";

/// Read-cache of durable vote totals: `tally:cache:votes:<participant>` -> i64
pub(crate) const VOTES_CACHE_PREFIX: &str = "tally:cache:votes:";

/// Ticket usage counters: `tally:ticket:<ticket_id>` -> remaining uses
pub(crate) const TICKET_USAGE_PREFIX: &str = "tally:ticket:";

/// Mutation locks: `tally:lock:<resource>` -> owner token
pub(crate) const VALUE_LOCK_PREFIX: &str = "tally:lock:";

/// Cache-repopulation singleflight locks: `tally:sf:<resource>` -> owner token
pub(crate) const SINGLEFLIGHT_LOCK_PREFIX: &str = "tally:sf:";

pub(crate) fn votes_delta_key(name: &str) -> String {
    format!("{}{}", VOTES_DELTA_PREFIX, name)
}

pub(crate) fn votes_cache_key(name: &str) -> String {
    format!("{}{}", VOTES_CACHE_PREFIX, name)
}

pub(crate) fn ticket_usage_key(ticket_id: &str) -> String {
    format!("{}{}", TICKET_USAGE_PREFIX, ticket_id)
}
