//! Default host lists derived from an application id.
//!
//! Each application gets a dedicated primary host per traffic class plus three
//! shared fallback hosts. Fallbacks are shuffled per client so that a fleet of
//! clients spreads its retries instead of all failing over to the same host.

use rand::seq::SliceRandom;

/// Number of fallback hosts provisioned per application.
pub const FALLBACK_HOST_COUNT: usize = 3;

/// Primary read host: `<app>-dsn.<domain>`.
pub fn read_primary(application_id: &str, primary_domain: &str) -> String {
    format!("{}-dsn.{}", application_id.to_lowercase(), primary_domain)
}

/// Primary write host: `<app>.<domain>`.
pub fn write_primary(application_id: &str, primary_domain: &str) -> String {
    format!("{}.{}", application_id.to_lowercase(), primary_domain)
}

/// Fallback hosts `<app>-1..=3.<domain>` in random order.
pub fn fallbacks(application_id: &str, fallback_domain: &str) -> Vec<String> {
    let app = application_id.to_lowercase();
    let mut hosts: Vec<String> = (1..=FALLBACK_HOST_COUNT)
        .map(|i| format!("{}-{}.{}", app, i, fallback_domain))
        .collect();
    hosts.shuffle(&mut rand::thread_rng());
    hosts
}

/// Full default read list: primary first, then shuffled fallbacks.
pub fn read_hosts(application_id: &str, primary_domain: &str, fallback_domain: &str) -> Vec<String> {
    let mut hosts = vec![read_primary(application_id, primary_domain)];
    hosts.extend(fallbacks(application_id, fallback_domain));
    hosts
}

/// Full default write list: primary first, then shuffled fallbacks.
pub fn write_hosts(application_id: &str, primary_domain: &str, fallback_domain: &str) -> Vec<String> {
    let mut hosts = vec![write_primary(application_id, primary_domain)];
    hosts.extend(fallbacks(application_id, fallback_domain));
    hosts
}
