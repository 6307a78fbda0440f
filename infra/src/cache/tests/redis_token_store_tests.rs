use chrono::{Duration, Utc};

use crate::cache::redis_token_store::remaining_seconds;

#[test]
fn test_remaining_seconds_rounds_up() {
    let now = Utc::now();
    assert_eq!(remaining_seconds(now + Duration::seconds(10), now), 10);
    assert_eq!(remaining_seconds(now + Duration::milliseconds(1500), now), 2);
    assert_eq!(remaining_seconds(now + Duration::milliseconds(1), now), 1);
}

#[test]
fn test_remaining_seconds_is_zero_once_expired() {
    let now = Utc::now();
    assert_eq!(remaining_seconds(now, now), 0);
    assert_eq!(remaining_seconds(now - Duration::seconds(5), now), 0);
}
