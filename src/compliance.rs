//! Crawl-policy compliance gate
//!
//! One-shot robots.txt permission check for the harvest target.
//! Harvesting must not begin when the gate denies. A robots.txt that
//! cannot be fetched permits the run (allow-all), matching common
//! crawler behavior for absent policies.

use url::Url;

/// Parsed robots.txt rules applicable to one user agent.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    disallow_patterns: Vec<String>,
    allow_patterns: Vec<String>,
}

impl RobotsPolicy {
    /// Parse robots.txt content, keeping the rule group that applies to
    /// `user_agent`. A group naming the agent specifically replaces any
    /// wildcard group seen earlier.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let ua_lower = user_agent.to_lowercase();
        let mut disallow_patterns = Vec::new();
        let mut allow_patterns = Vec::new();
        let mut group_applies = false;
        let mut found_specific_group = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match directive.trim().to_lowercase().as_str() {
                "user-agent" => {
                    let agent = value.to_lowercase();
                    if agent == "*" {
                        group_applies = !found_specific_group;
                    } else if ua_lower.contains(&agent) || agent.contains(&ua_lower) {
                        group_applies = true;
                        found_specific_group = true;
                        // Specific group supersedes wildcard rules
                        disallow_patterns.clear();
                        allow_patterns.clear();
                    } else {
                        group_applies = false;
                    }
                }
                "disallow" if group_applies && !value.is_empty() => {
                    disallow_patterns.push(value.to_string());
                }
                "allow" if group_applies && !value.is_empty() => {
                    allow_patterns.push(value.to_string());
                }
                _ => {}
            }
        }

        Self {
            disallow_patterns,
            allow_patterns,
        }
    }

    /// Empty policy permitting every path.
    pub fn allow_all() -> Self {
        Self {
            disallow_patterns: Vec::new(),
            allow_patterns: Vec::new(),
        }
    }

    /// Longest-match evaluation; on equal lengths, Allow wins.
    pub fn is_allowed(&self, path: &str) -> bool {
        let longest = |patterns: &[String]| {
            patterns
                .iter()
                .filter(|p| pattern_matches(path, p))
                .map(|p| p.len())
                .max()
                .unwrap_or(0)
        };
        longest(&self.allow_patterns) >= longest(&self.disallow_patterns)
    }
}

/// robots.txt pattern matching with `*` wildcards and `$` end anchors.
fn pattern_matches(path: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (pattern, false),
    };

    if pattern.contains('*') {
        let parts: Vec<&str> = pattern.split('*').collect();
        let mut position = 0;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            match path[position..].find(part) {
                Some(found) => {
                    if i == 0 && found != 0 {
                        return false;
                    }
                    position += found + part.len();
                }
                None => return false,
            }
        }
        return !anchored || position == path.len();
    }

    if anchored {
        path == pattern
    } else {
        path.starts_with(pattern)
    }
}

/// Check whether `user_agent` may fetch `target_url` per the host's
/// robots.txt.
pub async fn is_allowed(client: &reqwest::Client, target_url: &Url, user_agent: &str) -> bool {
    let Some(host) = target_url.host_str() else {
        return false;
    };
    let robots_url = format!("{}://{}/robots.txt", target_url.scheme(), host);

    let policy = match fetch_robots(client, &robots_url).await {
        Ok(content) => RobotsPolicy::parse(&content, user_agent),
        Err(e) => {
            tracing::debug!("robots.txt unavailable at {}: {}. Allowing.", robots_url, e);
            RobotsPolicy::allow_all()
        }
    };

    policy.is_allowed(target_url.path())
}

async fn fetch_robots(client: &reqwest::Client, robots_url: &str) -> Result<String, reqwest::Error> {
    let response = client.get(robots_url).send().await?;
    if response.status().is_success() {
        response.text().await
    } else {
        // Absent or broken robots.txt reads as allow-all
        Ok(String::new())
    }
}
