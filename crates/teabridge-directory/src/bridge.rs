//! Directory bridge
//!
//! Answers bind and search requests on behalf of an LDAP server. Binds
//! resolve to a result code only; searches surface an error alongside the
//! code so the server can log authorization and upstream problems.

use crate::cache::SnapshotCache;
use crate::dn::{strip_suffix, CanonicalName};
use crate::entry::DirectoryEntry;
use crate::filter::Filter;
use crate::layout::DirectoryLayout;
use crate::metrics;
use crate::snapshot::SnapshotBuilder;
use std::collections::HashSet;
use std::sync::Arc;
use teabridge_core::{
    BridgeConfig, Error, IdentityProvider, Result, ResultCode, USER_OBJECT_CLASS,
};
use tracing::{debug, error, info, warn};

/// Search scope requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Base,
    OneLevel,
    #[default]
    Subtree,
}

/// Search request as seen by the bridge
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub base_dn: String,
    pub scope: SearchScope,
    pub filter: Filter,
    /// Requested attributes; empty means all
    pub attributes: Vec<String>,
    /// Maximum entries to return; zero means unlimited
    pub size_limit: usize,
}

impl SearchRequest {
    pub fn new(base_dn: impl Into<String>, filter: Filter) -> Self {
        Self {
            base_dn: base_dn.into(),
            filter,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub entries: Vec<DirectoryEntry>,
    pub referrals: Vec<String>,
    pub controls: Vec<String>,
    pub result_code: ResultCode,
}

impl SearchResult {
    fn success(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            referrals: Vec::new(),
            controls: Vec::new(),
            result_code: ResultCode::Success,
        }
    }
}

pub struct DirectoryBridge {
    layout: DirectoryLayout,
    /// Lowercased canonical DNs allowed to search
    searchers: HashSet<String>,
    provider: Arc<dyn IdentityProvider>,
    snapshots: SnapshotCache,
}

impl DirectoryBridge {
    pub fn new(config: &BridgeConfig, provider: Arc<dyn IdentityProvider>) -> Result<Self> {
        config.validate()?;

        let layout = DirectoryLayout::from_config(&config.ldap);
        let searchers = config
            .ldap
            .searchers
            .iter()
            .map(|name| canonical_key(&layout.user_dn(name)))
            .collect();

        let builder = SnapshotBuilder::new(provider.clone(), layout.clone());
        let snapshots = SnapshotCache::new(builder, &config.cache);

        info!(
            base_dn = %layout.base_dn,
            searchers = config.ldap.searchers.len(),
            cache_enabled = snapshots.enabled(),
            "Directory bridge initialized"
        );

        Ok(Self {
            layout,
            searchers,
            provider,
            snapshots,
        })
    }

    /// Check a simple bind. Failures are reported through the result code.
    pub async fn bind(&self, bind_dn: &str, password: &str) -> ResultCode {
        let code = match self.username_from_dn(bind_dn) {
            Err(e) => {
                debug!(dn = %bind_dn, error = %e, "Rejecting bind DN");
                ResultCode::InvalidDnSyntax
            }
            Ok(username) => match self.provider.authenticate(username, password).await {
                Ok(user) => {
                    debug!(user = %user.username, "Bind succeeded");
                    ResultCode::Success
                }
                Err(e) => {
                    info!(user = %username, reason = %e, "Bind failed");
                    ResultCode::InvalidCredentials
                }
            },
        };

        metrics::record_bind(code);
        code
    }

    /// Extract the username from `<user attr>=<name>,<user parent>,<base>`
    fn username_from_dn<'a>(&self, bind_dn: &'a str) -> Result<&'a str> {
        let user_parent = self.layout.user_parent_rdn.as_str();
        let base = self.layout.base_dn.as_str();
        let rdn = strip_suffix(bind_dn, &[user_parent, base])?;

        if rdn.contains(',') {
            return Err(Error::InvalidDnSyntax(format!(
                "'{}' is not a direct child of '{},{}'",
                bind_dn, user_parent, base
            )));
        }

        let prefix_len = self.layout.user_attribute.len() + 1;
        let has_prefix = rdn
            .get(..prefix_len)
            .map(|p| {
                p.ends_with('=')
                    && p[..prefix_len - 1].eq_ignore_ascii_case(&self.layout.user_attribute)
            })
            .unwrap_or(false);
        if !has_prefix {
            return Err(Error::InvalidDnSyntax(format!(
                "'{}' is not named by '{}'",
                rdn, self.layout.user_attribute
            )));
        }

        let username = &rdn[prefix_len..];
        if username.is_empty() {
            return Err(Error::InvalidDnSyntax(format!("'{}' has no username", rdn)));
        }

        Ok(username)
    }

    /// Only allow-listed searchers may search, and only below the base DN
    pub fn check_search_permission(&self, bound_dn: &str, base_dn: &str) -> Result<()> {
        if bound_dn.is_empty() {
            return Err(Error::InsufficientAccess(
                "Anonymous BindDN not allowed".to_string(),
            ));
        }

        if !CanonicalName::parse(base_dn).is_within(&self.layout.base_dn) {
            return Err(Error::InsufficientAccess(format!(
                "search BaseDN {} is not in our BaseDN {}",
                base_dn, self.layout.base_dn
            )));
        }

        if !self.searchers.contains(&canonical_key(bound_dn)) {
            return Err(Error::InsufficientAccess(format!(
                "BindDN '{}' is not permitted to search",
                bound_dn
            )));
        }

        Ok(())
    }

    /// Gate on the requested object class; everything else is left to the caller
    pub fn check_filter(&self, filter: &Filter) -> Result<()> {
        match filter.object_class() {
            None => Ok(()),
            Some(class) if class.eq_ignore_ascii_case(USER_OBJECT_CLASS) => Ok(()),
            Some(class) => Err(Error::UnsupportedFilter(format!(
                "unhandled filter type: {} [{:?}]",
                class, filter
            ))),
        }
    }

    /// Return every user entry to a permitted searcher.
    ///
    /// Scope, filter and attribute selection are not applied here.
    pub async fn search(&self, bound_dn: &str, request: &SearchRequest) -> Result<SearchResult> {
        let outcome = self.search_inner(bound_dn, request).await;

        match &outcome {
            Ok(result) => metrics::record_search(result.result_code),
            Err(e) => {
                let code = e.result_code();
                if code == ResultCode::OperationsError {
                    error!(bound_dn = %bound_dn, error = %e, "Search failed");
                } else {
                    warn!(bound_dn = %bound_dn, base_dn = %request.base_dn, error = %e, "Search rejected");
                }
                metrics::record_search(code);
            }
        }

        outcome
    }

    async fn search_inner(&self, bound_dn: &str, request: &SearchRequest) -> Result<SearchResult> {
        self.check_search_permission(bound_dn, &request.base_dn)?;
        self.check_filter(&request.filter)?;

        let entries = self.snapshots.get_snapshot().await?;
        debug!(entries = entries.len(), "Search served");

        Ok(SearchResult::success(entries))
    }

    /// Connection teardown hook
    pub async fn close(&self, bound_dn: &str) -> Result<()> {
        debug!(bound_dn = %bound_dn, "Connection closed");
        Ok(())
    }
}

fn canonical_key(dn: &str) -> String {
    CanonicalName::parse(dn).as_str().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use std::time::Duration;
    use teabridge_core::{OrgRecord, TeamRecord};

    const ADMIN_DN: &str = "uid=admin,ou=users,dc=domain,dc=com";

    fn provider() -> Arc<FakeProvider> {
        let mut alice = FakeProvider::user(2, "alice");
        alice.email = "alice@domain.com".to_string();
        let mut mallory = FakeProvider::user(3, "mallory");
        mallory.active = false;

        Arc::new(
            FakeProvider::new()
                .with_user(FakeProvider::user(1, "admin"))
                .with_user(alice)
                .with_user(mallory)
                .with_password("admin", "secret")
                .with_password("alice", "password")
                .with_org(OrgRecord::new(10, "wonderland"))
                .with_teams(2, vec![TeamRecord::new(100, 10, "tea")]),
        )
    }

    fn bridge_with(provider: Arc<FakeProvider>, config: &BridgeConfig) -> DirectoryBridge {
        DirectoryBridge::new(config, provider).unwrap()
    }

    fn bridge(provider: Arc<FakeProvider>) -> DirectoryBridge {
        bridge_with(provider, &BridgeConfig::default())
    }

    fn request(base_dn: &str) -> SearchRequest {
        SearchRequest::new(base_dn, Filter::default())
    }

    #[tokio::test]
    async fn test_bind_success() {
        let provider = provider();
        let bridge = bridge(provider.clone());

        let code = bridge
            .bind("uid=alice,ou=users,dc=domain,dc=com", "password")
            .await;

        assert_eq!(code, ResultCode::Success);
        assert_eq!(provider.authenticate_count(), 1);
    }

    #[tokio::test]
    async fn test_bind_is_case_insensitive_on_suffix() {
        let bridge = bridge(provider());

        let code = bridge
            .bind("UID=alice,OU=Users,DC=Domain,DC=com", "password")
            .await;

        assert_eq!(code, ResultCode::Success);
    }

    #[tokio::test]
    async fn test_bind_wrong_password() {
        let bridge = bridge(provider());

        let code = bridge
            .bind("uid=alice,ou=users,dc=domain,dc=com", "invalid")
            .await;

        assert_eq!(code, ResultCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_bind_unknown_or_disabled_user() {
        let bridge = bridge(provider());

        assert_eq!(
            bridge.bind("uid=nobody,ou=users,dc=domain,dc=com", "password").await,
            ResultCode::InvalidCredentials
        );
        assert_eq!(
            bridge.bind("uid=mallory,ou=users,dc=domain,dc=com", "").await,
            ResultCode::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_bind_invalid_dn() {
        let provider = provider();
        let bridge = bridge(provider.clone());

        let cases = [
            "uid=some-username,dc=example,dc=com",
            "uid=some-username,dc=someone,dc=one",
            "uid=some-username,dc=domain,dc=com",
            "id=some-username,ou=users,dc=domain,dc=com",
            "dc=domain,dc=com",
            "dc=example,dc=com",
            "dc=someone,dc=one",
            "ou=users,dc=domain,dc=com",
            "uid=some-username,org=test,ou=users,dc=domain,dc=com",
            "uid=,ou=users,dc=domain,dc=com",
            "",
        ];

        for dn in cases {
            assert_eq!(
                bridge.bind(dn, "some-pass").await,
                ResultCode::InvalidDnSyntax,
                "dn: {}",
                dn
            );
        }
        assert_eq!(provider.authenticate_count(), 0);
    }

    #[tokio::test]
    async fn test_search_returns_all_users() {
        let bridge = bridge(provider());

        let result = bridge.search(ADMIN_DN, &request("dc=domain,dc=com")).await.unwrap();

        assert_eq!(result.result_code, ResultCode::Success);
        assert!(result.referrals.is_empty());
        assert!(result.controls.is_empty());
        let dns: Vec<_> = result.entries.iter().map(|e| e.dn.as_str()).collect();
        assert_eq!(
            dns,
            vec![
                "uid=admin,ou=users,dc=domain,dc=com",
                "uid=alice,ou=users,dc=domain,dc=com",
                "uid=mallory,ou=users,dc=domain,dc=com",
            ]
        );

        let alice = &result.entries[1];
        assert_eq!(
            alice.values("memberOf").collect::<Vec<_>>(),
            vec![
                "cn=wonderland,ou=groups,dc=domain,dc=com",
                "cn=wonderland[tea],ou=groups,dc=domain,dc=com",
            ]
        );
        let mallory = &result.entries[2];
        assert_eq!(mallory.values("loginDisabled").collect::<Vec<_>>(), vec!["true"]);
    }

    #[tokio::test]
    async fn test_search_accepts_inetorgperson_filter() {
        let bridge = bridge(provider());
        let filter = Filter::And(vec![
            Filter::Equality("objectClass".into(), "inetOrgPerson".into()),
            Filter::Equality("uid".into(), "alice".into()),
        ]);

        let result = bridge
            .search(ADMIN_DN, &SearchRequest::new("ou=users,dc=domain,dc=com", filter))
            .await
            .unwrap();

        assert_eq!(result.entries.len(), 3);
    }

    #[tokio::test]
    async fn test_search_anonymous_rejected() {
        let provider = provider();
        let bridge = bridge(provider.clone());

        for base in ["dc=domain,dc=com", "dc=other,dc=org", ""] {
            let err = bridge.search("", &request(base)).await.unwrap_err();
            assert_eq!(err.result_code(), ResultCode::InsufficientAccessRights);
            assert!(err.to_string().contains("Anonymous"));
        }
        assert_eq!(provider.list_users_count(), 0);
    }

    #[tokio::test]
    async fn test_search_invalid_requests() {
        let bridge = bridge(provider());

        let cases = [
            ("uid=alice,ou=users,dc=domain,dc=com", "dc=domain,dc=com"),
            ("uid=admin,ou=users,dc=example,dc=com", "dc=domain,dc=com"),
            (ADMIN_DN, "dc=example,dc=com"),
            (ADMIN_DN, "dc=otherdomain,dc=com"),
            (ADMIN_DN, "dc=com"),
        ];

        for (bound, base) in cases {
            let err = bridge.search(bound, &request(base)).await.unwrap_err();
            assert_eq!(
                err.result_code(),
                ResultCode::InsufficientAccessRights,
                "bound: {}, base: {}",
                bound,
                base
            );
        }
    }

    #[tokio::test]
    async fn test_search_searcher_match_is_case_insensitive() {
        let bridge = bridge(provider());

        let result = bridge
            .search("UID=Admin,OU=users,dc=DOMAIN,dc=com", &request("DC=Domain,DC=Com"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_search_other_object_class() {
        let bridge = bridge(provider());
        let filter = Filter::Equality("objectClass".into(), "person".into());

        let err = bridge
            .search(ADMIN_DN, &SearchRequest::new("dc=domain,dc=com", filter))
            .await
            .unwrap_err();

        assert_eq!(err.result_code(), ResultCode::OperationsError);
        assert!(err.to_string().starts_with("Search Error: unhandled filter type: person"));
    }

    #[tokio::test]
    async fn test_search_provider_failure() {
        let provider = Arc::new(FakeProvider::new().fail_listing());
        let bridge = bridge(provider);

        let err = bridge
            .search(ADMIN_DN, &request("dc=domain,dc=com"))
            .await
            .unwrap_err();

        assert_eq!(err.result_code(), ResultCode::OperationsError);
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn test_configured_searchers() {
        let mut config = BridgeConfig::default();
        config.ldap.searchers = vec!["alice".to_string()];
        let bridge = bridge_with(provider(), &config);

        assert!(bridge
            .search("uid=alice,ou=users,dc=domain,dc=com", &request("dc=domain,dc=com"))
            .await
            .is_ok());
        assert!(bridge.search(ADMIN_DN, &request("dc=domain,dc=com")).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_uses_cache_within_ttl() {
        let provider = provider();
        let mut config = BridgeConfig::default();
        config.cache.ttl_seconds = 5;
        let bridge = bridge_with(provider.clone(), &config);

        for _ in 0..3 {
            bridge.search(ADMIN_DN, &request("dc=domain,dc=com")).await.unwrap();
        }
        assert_eq!(provider.list_users_count(), 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        bridge.search(ADMIN_DN, &request("dc=domain,dc=com")).await.unwrap();
        bridge.search(ADMIN_DN, &request("dc=domain,dc=com")).await.unwrap();
        assert_eq!(provider.list_users_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = BridgeConfig::default();
        config.ldap.base_dn = "nothing".to_string();

        assert!(DirectoryBridge::new(&config, provider()).is_err());
    }

    #[tokio::test]
    async fn test_close_always_succeeds() {
        let bridge = bridge(provider());
        assert!(bridge.close("").await.is_ok());
        assert!(bridge.close(ADMIN_DN).await.is_ok());
    }
}
