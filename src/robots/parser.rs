//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate. Crawl-delay
//! and Sitemap directives are not covered by it and are read here.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to check, absolute or a bare path
    /// * `user_agent` - The product token to match groups against
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A delay in a group naming the agent beats one in the `*` group.
    /// Consecutive `User-agent` lines form one group; the next `User-agent`
    /// line after any other directive starts a new group.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no usable crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let normalized_agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut for_wildcard: Option<f64> = None;
        let mut for_agent: Option<f64> = None;

        for (key, value) in directives(&self.content) {
            if key == "user-agent" {
                if !in_agent_lines {
                    group.clear();
                }
                group.push(value.to_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }

            let delay = match value.parse::<f64>() {
                Ok(d) if d.is_finite() && d >= 0.0 => d,
                _ => continue,
            };

            let names_agent = group
                .iter()
                .any(|ua| ua != "*" && !ua.is_empty() && normalized_agent.contains(ua.as_str()));
            if names_agent {
                for_agent.get_or_insert(delay);
            } else if group.iter().any(|ua| ua == "*") {
                for_wildcard.get_or_insert(delay);
            }
        }

        for_agent.or(for_wildcard)
    }

    /// Returns the URLs declared with `Sitemap:` lines, in file order
    pub fn sitemaps(&self) -> Vec<String> {
        sitemap_directives(&self.content)
    }
}

/// Scans robots.txt text for `Sitemap:` lines, case-insensitively
pub fn sitemap_directives(content: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for (key, value) in directives(content) {
        if key == "sitemap" && !value.is_empty() && !found.iter().any(|s| s == value) {
            found.push(value.to_string());
        }
    }
    found
}

/// Yields `(lowercased key, trimmed value)` for every directive line
fn directives(content: &str) -> impl Iterator<Item = (String, &str)> {
    content.lines().filter_map(|line| {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            return None;
        }
        let (key, value) = line.split_once(':')?;
        Some((key.trim().to_lowercase(), value.trim()))
    })
}
