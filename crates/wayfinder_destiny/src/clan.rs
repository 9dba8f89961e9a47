//! Clan and profile lookups.

use crate::{Clan, ComponentType, DestinyClient, GroupMember, GroupResponse, MembersResponse, Profile};
use tracing::{debug, instrument};
use wayfinder_error::DestinyError;

impl DestinyClient {
    /// Look up a clan by its exact name.
    ///
    /// # Errors
    ///
    /// Returns the request error on a cache miss that fails upstream.
    #[instrument(skip(self))]
    pub async fn get_clan_by_name(&self, name: &str) -> Result<Clan, DestinyError> {
        let key = format!("destiny:clan:name:{}", name.to_lowercase());
        let url = self.platform_url(&["GroupV2", "Name", name, "1"])?;
        self.cache()
            .get_or_fetch(&key, self.ttls().clan, || async {
                let group: GroupResponse = self.get_platform_url(&url).await?;
                Ok(group.detail)
            })
            .await
    }

    /// Current member list of a clan.
    ///
    /// # Errors
    ///
    /// Returns the request error on a cache miss that fails upstream.
    #[instrument(skip(self))]
    pub async fn get_clan_members(&self, group_id: i64) -> Result<Vec<GroupMember>, DestinyError> {
        let key = format!("destiny:clan:{group_id}:members");
        let path = format!("/GroupV2/{group_id}/Members/");
        let members = self
            .cache()
            .get_or_fetch(&key, self.ttls().clan, || async {
                let page: MembersResponse = self.get_platform(&path).await?;
                Ok::<_, DestinyError>(page.results)
            })
            .await?;
        debug!(count = members.len(), "Loaded clan members");
        Ok(members)
    }

    /// Selected components of one player's profile.
    ///
    /// The cache key includes the component list, so lookups asking for
    /// different components never serve each other.
    ///
    /// # Errors
    ///
    /// Returns the request error on a cache miss that fails upstream.
    #[instrument(skip(self))]
    pub async fn get_profile(
        &self,
        membership_type: i32,
        membership_id: &str,
        components: &[ComponentType],
    ) -> Result<Profile, DestinyError> {
        let codes = ComponentType::join(components);
        let key = format!("destiny:profile:{membership_type}:{membership_id}:{codes}");
        let path = format!("/Destiny2/{membership_type}/Profile/{membership_id}/?components={codes}");
        self.cache()
            .get_or_fetch(&key, self.ttls().profile, || self.get_platform::<Profile>(&path))
            .await
    }
}
