use crate::errors::Misconfiguration;

/// Legacy numeric roles and the permission template each one resolves to.
///
/// Lower numbers carry more privilege. Every role stored on a user must have
/// a variant here; an unknown number is a deployment defect, not a caller error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LegacyRole {
    Admin = 1,
    Manager = 2,
    Collaborator = 3,
    Reader = 4,
    Guest = 5,
}

impl LegacyRole {
    pub const ALL: [LegacyRole; 5] = [
        LegacyRole::Admin,
        LegacyRole::Manager,
        LegacyRole::Collaborator,
        LegacyRole::Reader,
        LegacyRole::Guest,
    ];

    pub const fn rank(self) -> i64 {
        self as i64
    }

    /// Name of the `permission_templates.role_name` this role maps to.
    pub const fn template_name(self) -> &'static str {
        match self {
            LegacyRole::Admin => "Admin",
            LegacyRole::Manager => "Manager",
            LegacyRole::Collaborator => "Collaborator",
            LegacyRole::Reader => "Reader",
            LegacyRole::Guest => "Guest",
        }
    }
}

impl TryFrom<i64> for LegacyRole {
    type Error = Misconfiguration;

    fn try_from(role: i64) -> Result<Self, Self::Error> {
        LegacyRole::ALL
            .into_iter()
            .find(|candidate| candidate.rank() == role)
            .ok_or(Misconfiguration::InvalidRole { role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_round_trips_through_its_rank() {
        for role in LegacyRole::ALL {
            assert_eq!(LegacyRole::try_from(role.rank()), Ok(role));
        }
    }

    #[test]
    fn roles_map_to_template_names() {
        assert_eq!(LegacyRole::Admin.template_name(), "Admin");
        assert_eq!(LegacyRole::Manager.template_name(), "Manager");
        assert_eq!(LegacyRole::Collaborator.template_name(), "Collaborator");
        assert_eq!(LegacyRole::Reader.template_name(), "Reader");
        assert_eq!(LegacyRole::Guest.template_name(), "Guest");
    }

    #[test]
    fn unmapped_role_is_a_misconfiguration() {
        assert_eq!(
            LegacyRole::try_from(99),
            Err(Misconfiguration::InvalidRole { role: 99 })
        );
        assert_eq!(
            LegacyRole::try_from(0),
            Err(Misconfiguration::InvalidRole { role: 0 })
        );
    }
}
