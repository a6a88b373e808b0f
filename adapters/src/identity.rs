use uuid::Uuid;

use application::ports::out_::IdentityProvider;
use domain::UserIdentity;

/// An identity fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    identity: UserIdentity,
}

impl StaticIdentity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            identity: UserIdentity::new(id, name),
        }
    }

    /// Fresh random id, for participants without a stored one.
    pub fn generated(name: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().simple().to_string(), name)
    }
}

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> UserIdentity {
        self.identity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = StaticIdentity::generated("A").identity();
        let b = StaticIdentity::generated("A").identity();
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "A");
        assert_eq!(a.id.as_str().len(), 32);
    }
}
