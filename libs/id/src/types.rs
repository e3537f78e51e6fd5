use crate::{define_id, PrefixedId};

define_id!(
    /// Identity of a stored object, assigned once on create.
    ObjectUid => "uid"
);

define_id!(
    /// Minted per egg; its ULID becomes the suffix of the egg's name.
    EggToken => "egg"
);

impl EggToken {
    /// The ULID in lowercase, valid inside an object name.
    #[must_use]
    pub fn name_fragment(&self) -> String {
        self.ulid().to_string().to_lowercase()
    }
}

define_id!(RunId => "run");

define_id!(RequestId => "req");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdError, Ulid};
    use proptest::prelude::*;

    #[test]
    fn display_then_parse() {
        let id = ObjectUid::new();
        let rendered = id.to_string();
        assert!(rendered.starts_with("uid_"));
        assert_eq!(rendered.parse::<ObjectUid>().unwrap(), id);
    }

    #[test]
    fn name_fragment_is_lowercase_ulid() {
        let token = EggToken::new();
        let fragment = token.name_fragment();
        assert_eq!(fragment.len(), 26);
        assert_eq!(fragment, fragment.to_lowercase());
        // Crockford base32 decoding ignores case.
        assert_eq!(fragment.parse::<Ulid>().unwrap(), token.ulid());
    }

    #[test]
    fn parse_errors() {
        assert_eq!(EggToken::parse(""), Err(IdError::Empty));
        assert!(matches!(
            ObjectUid::parse("uid01HV4Z2WQXKJNM8GPQY6VBKC3D"),
            Err(IdError::Malformed { expected: "uid", .. })
        ));
        assert_eq!(
            RunId::parse("egg_01HV4Z2WQXKJNM8GPQY6VBKC3D"),
            Err(IdError::WrongKind {
                expected: "run",
                found: "egg".to_string(),
            })
        );
        assert!(matches!(EggToken::parse("egg_nope"), Err(IdError::Ulid(_))));
    }

    #[test]
    fn serde_uses_prefixed_string() {
        let id = ObjectUid::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(serde_json::from_str::<ObjectUid>(&json).unwrap(), id);

        let wrong = serde_json::to_string(&RequestId::new()).unwrap();
        assert!(serde_json::from_str::<ObjectUid>(&wrong).is_err());
    }

    #[test]
    fn later_tokens_sort_later() {
        let first = EggToken::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(first < EggToken::new());
    }

    #[test]
    fn prefixes_are_distinct() {
        let prefixes = [ObjectUid::PREFIX, EggToken::PREFIX, RunId::PREFIX, RequestId::PREFIX];
        let unique: std::collections::BTreeSet<_> = prefixes.iter().collect();
        assert_eq!(unique.len(), prefixes.len());
    }

    proptest! {
        #[test]
        fn foreign_prefixes_are_wrong_kind(prefix in "[a-z]{1,6}") {
            prop_assume!(prefix != EggToken::PREFIX);
            let err = EggToken::parse(&format!("{prefix}_01HV4Z2WQXKJNM8GPQY6VBKC3D")).unwrap_err();
            prop_assert!(err.is_wrong_kind());
        }

        #[test]
        fn any_ulid_survives_rendering(raw in any::<u128>()) {
            let token = EggToken::from_ulid(Ulid(raw));
            prop_assert_eq!(EggToken::parse(&token.to_string()).unwrap(), token);
        }
    }
}
