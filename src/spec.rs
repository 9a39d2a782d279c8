//! Query predicates against which cookies are matched.

/// A query predicate: match cookies by name and domain.
///
/// `name` supports the literal wildcard `%`, meaning "any name". `domain`
/// is matched against a stored host as exact equality, equality with a
/// leading dot, or a dot-bounded suffix match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieSpec {
    pub name: String,
    pub domain: String,
}

/// Name wildcard accepted by [`CookieSpec::name`].
pub const NAME_WILDCARD: &str = "%";

impl CookieSpec {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
        }
    }

    /// Shorthand for `{ name: "%", domain }`.
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self::new(NAME_WILDCARD, domain)
    }

    pub fn name_is_wildcard(&self) -> bool {
        self.name == NAME_WILDCARD
    }

    /// Whether a cookie named `name` satisfies this spec's name predicate.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name_is_wildcard() || self.name == name
    }

    /// Whether a stored `host` satisfies this spec's domain predicate.
    ///
    /// A host matches if it is exactly the spec's domain, the spec's
    /// domain prefixed with a dot, or a dot-bounded suffix of the spec's
    /// domain (e.g. `api.example.com` matches `example.com`, but
    /// `notexample.com` and `example.com.evil` do not).
    pub fn matches_domain(&self, host: &str) -> bool {
        domain_matches(host, &self.domain)
    }

    pub fn matches(&self, name: &str, host: &str) -> bool {
        self.matches_name(name) && self.matches_domain(host)
    }
}

/// Builds one SQL `WHERE` fragment matching any of `specs`, OR'd
/// together, plus the positional parameter values in the order the
/// fragment's placeholders reference them.
///
/// Lets a SQLite-backed strategy answer a batch of specs with a single
/// query instead of fanning out one per spec.
pub fn build_combined_predicate(
    specs: &[CookieSpec],
    name_column: &str,
    domain_column: &str,
) -> (String, Vec<String>) {
    let mut clauses = Vec::with_capacity(specs.len());
    let mut values = Vec::new();
    let mut next_param = 1usize;

    for spec in specs {
        let name_clause = if spec.name_is_wildcard() {
            "1".to_string()
        } else {
            let clause = format!("{name_column} = ?{next_param}");
            next_param += 1;
            values.push(spec.name.clone());
            clause
        };

        let domain_clause = format!(
            "({domain_column} = ?{a} OR {domain_column} = ?{b} OR {domain_column} LIKE ?{c})",
            a = next_param,
            b = next_param + 1,
            c = next_param + 2,
        );
        values.push(spec.domain.clone());
        values.push(format!(".{}", spec.domain));
        values.push(format!("%.{}", spec.domain));
        next_param += 3;

        clauses.push(format!("({name_clause} AND {domain_clause})"));
    }

    (clauses.join(" OR "), values)
}

/// Whether `host` (as stored by a browser) satisfies the domain predicate
/// for `domain` (as given in a [`CookieSpec`]).
pub fn domain_matches(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }

    let dotted = format!(".{domain}");
    if host == dotted {
        return true;
    }

    host.ends_with(&dotted)
}
