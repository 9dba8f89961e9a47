//! Per-member title report.

use crate::{ComponentType, DestinyClient, Profile, RecordDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};
use wayfinder_error::DestinyError;

/// A title as held by one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    /// Title name
    pub name: String,
    /// Relative icon path
    pub icon: String,
    /// Whether the member has earned it
    pub earned: bool,
    /// Number of times the member has gilded it
    pub gilded_count: i32,
}

/// Titles of one clan member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTitles {
    /// Member display name
    pub name: String,
    /// Titles sorted by name
    pub titles: Vec<Title>,
}

/// Title report for a whole clan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClanTitles {
    /// Sum of the members' active triumph scores
    pub total_score: i64,
    /// One entry per member, in roster order
    pub members: Vec<MemberTitles>,
}

/// Keep only the definitions that grant a title.
pub fn title_definitions(
    definitions: HashMap<String, RecordDefinition>,
) -> HashMap<String, RecordDefinition> {
    definitions
        .into_iter()
        .filter(|(_, definition)| definition.title_info.has_title)
        .collect()
}

/// Work out which titles a profile holds.
///
/// A title whose gilding record is missing from the profile is skipped.
pub fn titles_from_profile(profile: &Profile, titles: &HashMap<String, RecordDefinition>) -> Vec<Title> {
    let Some(records) = profile.records() else {
        return Vec::new();
    };

    let mut held = Vec::new();
    for (key, record) in records {
        let Some(definition) = titles.get(key) else {
            continue;
        };

        let mut gilded_count = 0;
        if let Some(gilding_hash) = definition.title_info.gilding_tracking_record_hash.filter(|h| *h > 0) {
            let gilding_key = gilding_hash.to_string();
            match records.get(&gilding_key) {
                Some(gilding) => gilded_count = gilding.completed_count.unwrap_or_default(),
                None => {
                    warn!(record = %gilding_key, title = %key, "Gilding record missing from profile");
                    continue;
                }
            }
        }

        held.push(Title {
            name: definition.display_properties.name.clone(),
            icon: definition.display_properties.icon.clone(),
            earned: record.objectives.first().is_some_and(|o| o.complete),
            gilded_count,
        });
    }

    held.sort_by(|a, b| a.name.cmp(&b.name));
    held
}

impl DestinyClient {
    /// Title report for every member of `group_id`.
    ///
    /// # Errors
    ///
    /// Returns the first manifest, roster or profile error.
    #[instrument(skip(self))]
    pub async fn clan_titles(&self, group_id: i64) -> Result<ClanTitles, DestinyError> {
        let titles = title_definitions(self.record_definitions().await?);
        debug!(count = titles.len(), "Loaded title definitions");

        let mut report = ClanTitles::default();
        for member in self.get_clan_members(group_id).await? {
            let info = &member.destiny_user_info;
            let profile = self
                .get_profile(info.membership_type, &info.membership_id, &[ComponentType::Records])
                .await?;

            report.total_score += profile
                .profile_records
                .as_ref()
                .and_then(|c| c.data.as_ref())
                .map_or(0, |d| d.active_score);
            report.members.push(MemberTitles {
                name: info.display_name.clone(),
                titles: titles_from_profile(&profile, &titles),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definitions() -> HashMap<String, RecordDefinition> {
        serde_json::from_str(
            r#"{
                "1": {"displayProperties": {"name": "Dredgen", "icon": "/d.png"},
                      "titleInfo": {"hasTitle": true, "gildingTrackingRecordHash": 10}},
                "2": {"displayProperties": {"name": "Cursebreaker", "icon": "/c.png"},
                      "titleInfo": {"hasTitle": true}},
                "3": {"displayProperties": {"name": "Conqueror", "icon": "/q.png"},
                      "titleInfo": {"hasTitle": true, "gildingTrackingRecordHash": 30}},
                "4": {"displayProperties": {"name": "Not a title"}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_title_definitions() {
        let titles = title_definitions(definitions());
        assert_eq!(titles.len(), 3);
        assert!(!titles.contains_key("4"));
    }

    #[test]
    fn test_titles_from_profile() {
        let profile: Profile = serde_json::from_str(
            r#"{"profileRecords": {"data": {"activeScore": 100, "records": {
                "1": {"objectives": [{"objectiveHash": 1, "complete": true}]},
                "10": {"completedCount": 3},
                "2": {"objectives": [{"objectiveHash": 2, "complete": false}]},
                "3": {"objectives": [{"objectiveHash": 3, "complete": true}]},
                "4": {"objectives": [{"objectiveHash": 4, "complete": true}]}
            }}}}"#,
        )
        .unwrap();

        let titles = titles_from_profile(&profile, &title_definitions(definitions()));
        let names: Vec<_> = titles.iter().map(|t| t.name.as_str()).collect();
        // Conqueror has no gilding record in the profile
        assert_eq!(names, vec!["Cursebreaker", "Dredgen"]);
        assert!(!titles[0].earned);
        assert_eq!(titles[1].gilded_count, 3);
        assert!(titles[1].earned);
    }

    #[test]
    fn test_titles_from_profile_without_records() {
        let titles = titles_from_profile(&Profile::default(), &title_definitions(definitions()));
        assert!(titles.is_empty());
    }
}
