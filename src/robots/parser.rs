//! Robots.txt parser implementation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate, a port of
//! Google's matcher: the longest matching rule for the agent's group wins,
//! falling back to the `*` group when the agent has no group of its own.

use robotstxt::{parse_robotstxt, DefaultMatcher, RobotsParseHandler};

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's types, providing a simplified
/// interface for checking if URLs are allowed.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    ///
    /// # Returns
    ///
    /// A ParsedRobots instance that can be used to check URL permissions
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used as the default when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns true if this is the permissive fail-open record
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to check (absolute, or a path such as "/page.html")
    /// * `user_agent` - The full agent string; only its product token is matched
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            // Empty content or explicit allow-all means allow all
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// Groups are selected the same way as for `is_allowed`: the agent's own
    /// group (exact, case-insensitive product token match) replaces `*`, which
    /// only applies when the agent has no group at all.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If the applicable group specifies no crawl delay
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let mut scan = CrawlDelayScan::new(product_token(user_agent));
        parse_robotstxt(&self.content, &mut scan);
        scan.result()
    }
}

/// Collects `Crawl-delay` values per group while robotstxt walks the file
///
/// Group boundaries follow the crate's matcher: a `User-agent` line after any
/// rule line starts a new group.
struct CrawlDelayScan<'a> {
    agent: &'a str,
    in_specific_group: bool,
    in_global_group: bool,
    seen_separator: bool,
    ever_seen_specific_group: bool,
    specific_delay: Option<f64>,
    global_delay: Option<f64>,
}

impl<'a> CrawlDelayScan<'a> {
    fn new(agent: &'a str) -> Self {
        Self {
            agent,
            in_specific_group: false,
            in_global_group: false,
            seen_separator: false,
            ever_seen_specific_group: false,
            specific_delay: None,
            global_delay: None,
        }
    }

    fn result(&self) -> Option<f64> {
        if self.ever_seen_specific_group {
            self.specific_delay
        } else {
            self.global_delay
        }
    }

    fn in_any_group(&self) -> bool {
        self.in_specific_group || self.in_global_group
    }
}

impl RobotsParseHandler for CrawlDelayScan<'_> {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        if self.seen_separator {
            self.in_specific_group = false;
            self.in_global_group = false;
            self.seen_separator = false;
        }

        if user_agent.starts_with('*')
            && (user_agent.len() == 1 || user_agent[1..].starts_with(char::is_whitespace))
        {
            self.in_global_group = true;
        } else if agent_name(user_agent).eq_ignore_ascii_case(self.agent) {
            self.in_specific_group = true;
            self.ever_seen_specific_group = true;
        }
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {
        if self.in_any_group() {
            self.seen_separator = true;
        }
    }

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {
        if self.in_any_group() {
            self.seen_separator = true;
        }
    }

    fn handle_sitemap(&mut self, _line_num: u32, _value: &str) {
        self.seen_separator = true;
    }

    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        self.seen_separator = true;

        if !action.eq_ignore_ascii_case("crawl-delay") {
            return;
        }
        let Ok(delay) = value.trim().parse::<f64>() else {
            return;
        };
        if !delay.is_finite() || delay < 0.0 {
            return;
        }

        if self.in_specific_group {
            self.specific_delay.get_or_insert(delay);
        }
        if self.in_global_group {
            self.global_delay.get_or_insert(delay);
        }
    }
}

/// Leading `[a-zA-Z_-]` run of a `User-agent` value, as the matcher compares it
fn agent_name(user_agent: &str) -> &str {
    user_agent
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .map_or(user_agent, |end| &user_agent[..end])
}

/// Extracts the product token robots.txt groups are matched against
///
/// `"PoliteFetch/1.0 (+https://example.com/bot)"` becomes `"PoliteFetch"`.
pub fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    trimmed
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(trimmed)
}
