use sqlx::{Postgres, QueryBuilder};

use super::model::UserRecord;

/// Arguments accepted by the `users` listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    NotSuperuser,
    UsernameContains(String),
    IsActive(bool),
}

/// Conjunction of clauses. Always starts by excluding superusers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPredicate {
    clauses: Vec<Clause>,
}

impl Default for UserPredicate {
    fn default() -> Self {
        Self {
            clauses: vec![Clause::NotSuperuser],
        }
    }
}

impl UserPredicate {
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    #[cfg(test)]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    #[cfg(test)]
    pub fn matches(&self, user: &UserRecord) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::NotSuperuser => !user.is_superuser,
            Clause::UsernameContains(needle) => user
                .username
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Clause::IsActive(active) => user.is_active == *active,
        })
    }

    /// Appends ` WHERE ...` for every clause to `qb`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE ");
        let mut conds = qb.separated(" AND ");
        for clause in &self.clauses {
            match clause {
                Clause::NotSuperuser => {
                    conds.push("is_superuser = FALSE");
                }
                Clause::UsernameContains(needle) => {
                    conds.push("username ILIKE ");
                    conds.push_bind_unseparated(like_pattern(needle));
                }
                Clause::IsActive(active) => {
                    conds.push("is_active = ");
                    conds.push_bind_unseparated(*active);
                }
            }
        }
    }
}

impl From<&UserFilter> for UserPredicate {
    fn from(filter: &UserFilter) -> Self {
        let mut predicate = UserPredicate::default();
        if let Some(username) = filter.username.as_deref().filter(|u| !u.is_empty()) {
            predicate = predicate.and(Clause::UsernameContains(username.to_string()));
        }
        if let Some(active) = filter.is_active {
            predicate = predicate.and(Clause::IsActive(active));
        }
        predicate
    }
}

/// `%needle%` with LIKE metacharacters escaped (backslash is the default escape).
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
