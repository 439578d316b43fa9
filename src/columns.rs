// Column discovery by naming convention.
//
// Day-indexed metric columns are named `<dayKey>_<role>`. The classifier is
// run once per table and the resulting groups are passed down the pipeline,
// so nothing downstream looks at raw column names again.
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Demand,
    Shows,
    Position,
    Clicks,
    Ctr,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Demand,
        Role::Shows,
        Role::Position,
        Role::Clicks,
        Role::Ctr,
    ];

    /// Column-name suffix including the separating underscore.
    pub fn suffix(self) -> &'static str {
        match self {
            Role::Demand => "_demand",
            Role::Shows => "_shows",
            Role::Position => "_position",
            Role::Clicks => "_clicks",
            Role::Ctr => "_ctr",
        }
    }

    /// Matches a column name against the known suffixes. Case-sensitive.
    pub fn of_column(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| name.ends_with(r.suffix()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.suffix()[1..])
    }
}

/// Column indices per role, each group kept in table column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGroups {
    groups: BTreeMap<Role, Vec<usize>>,
}

impl RoleGroups {
    pub fn get(&self, role: Role) -> &[usize] {
        self.groups.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, role: Role) -> bool {
        !self.get(role).is_empty()
    }

    /// Number of day columns carrying `role`.
    pub fn days(&self, role: Role) -> usize {
        self.get(role).len()
    }
}

pub fn classify<S: AsRef<str>>(column_names: &[S]) -> RoleGroups {
    let mut groups: BTreeMap<Role, Vec<usize>> = BTreeMap::new();
    for (idx, name) in column_names.iter().enumerate() {
        if let Some(role) = Role::of_column(name.as_ref()) {
            groups.entry(role).or_default().push(idx);
        }
    }
    RoleGroups { groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn groups_columns_by_suffix() {
        let cols = [
            "Query",
            "2024-01-01_demand",
            "2024-01-01_shows",
            "2024-01-02_demand",
            "2024-01-01_position",
            "2024-01-01_clicks",
            "2024-01-01_ctr",
        ];
        let groups = classify(&cols);
        assert_eq!(groups.get(Role::Demand), &[1, 3]);
        assert_eq!(groups.get(Role::Shows), &[2]);
        assert_eq!(groups.get(Role::Position), &[4]);
        assert_eq!(groups.get(Role::Clicks), &[5]);
        assert_eq!(groups.get(Role::Ctr), &[6]);
        assert_eq!(groups.days(Role::Demand), 2);
    }

    #[test]
    fn absent_role_is_an_empty_group() {
        let groups = classify(&["Url", "d1_shows"]);
        assert!(!groups.has(Role::Demand));
        assert!(groups.get(Role::Demand).is_empty());
    }

    #[test]
    fn suffix_match_is_case_sensitive_and_exact() {
        let groups = classify(&["d1_Demand", "d1_demands", "demand", "d1_demand"]);
        assert_eq!(groups.get(Role::Demand), &[3]);
    }

    #[test]
    fn any_number_of_days_is_supported() {
        let cols: Vec<String> = (0..30).map(|d| format!("day{d}_clicks")).collect();
        assert_eq!(classify(&cols).days(Role::Clicks), 30);
    }

    #[test]
    fn partitions_are_disjoint_and_cover_every_suffixed_column() {
        let cols = [
            "a_demand", "b_shows", "c_position", "d_clicks", "e_ctr", "Query", "f_demand",
            "x_ctr_shows", "plain",
        ];
        let groups = classify(&cols);
        let mut seen = HashSet::new();
        for role in Role::ALL {
            for idx in groups.get(role) {
                assert!(seen.insert(*idx), "column {idx} in two groups");
                assert!(cols[*idx].ends_with(role.suffix()));
            }
        }
        let suffixed = cols.iter().filter(|c| Role::of_column(c).is_some()).count();
        assert_eq!(seen.len(), suffixed);
    }
}
