//! Per-connection LDAP session

use crate::search::{convert_filter, convert_scope, in_scope, ldap_code, ldap_result, project};
use ldap3_server::proto::{
    LdapBindCred, LdapBindRequest, LdapBindResponse, LdapExtendedResponse, LdapMsg, LdapOp,
    LdapResultCode, LdapSearchRequest,
};
use std::sync::Arc;
use teabridge_core::ResultCode;
use teabridge_directory::{CanonicalName, DirectoryBridge, SearchRequest};
use tracing::{debug, warn};

/// Protocol state of one client connection.
///
/// An empty bound DN means anonymous.
pub struct LdapSession {
    bridge: Arc<DirectoryBridge>,
    bound_dn: String,
}

impl LdapSession {
    pub fn new(bridge: Arc<DirectoryBridge>) -> Self {
        Self {
            bridge,
            bound_dn: String::new(),
        }
    }

    pub fn bound_dn(&self) -> &str {
        &self.bound_dn
    }

    /// Handle one request. `None` means the client unbound and the
    /// connection should be closed.
    pub async fn handle_message(&mut self, msg: LdapMsg) -> Option<Vec<LdapMsg>> {
        let msgid = msg.msgid;
        let ops = match msg.op {
            LdapOp::BindRequest(request) => vec![self.do_bind(&request).await],
            LdapOp::SearchRequest(request) => self.do_search(&request).await,
            LdapOp::UnbindRequest => {
                self.close().await;
                return None;
            }
            op => {
                debug!(op = ?op, "Unsupported operation");
                vec![LdapOp::ExtendedResponse(LdapExtendedResponse {
                    res: ldap_result(LdapResultCode::UnwillingToPerform, "Unsupported operation"),
                    name: None,
                    value: None,
                })]
            }
        };

        Some(
            ops.into_iter()
                .map(|op| LdapMsg {
                    msgid,
                    op,
                    ctrl: vec![],
                })
                .collect(),
        )
    }

    async fn do_bind(&mut self, request: &LdapBindRequest) -> LdapOp {
        let LdapBindCred::Simple(password) = &request.cred;

        let code = if request.dn.is_empty() && password.is_empty() {
            debug!("Anonymous bind");
            ResultCode::Success
        } else {
            self.bridge.bind(&request.dn, password).await
        };

        self.bound_dn = if code.is_success() {
            request.dn.clone()
        } else {
            String::new()
        };

        LdapOp::BindResponse(LdapBindResponse {
            res: ldap_result(ldap_code(code), ""),
            saslcreds: None,
        })
    }

    async fn do_search(&mut self, request: &LdapSearchRequest) -> Vec<LdapOp> {
        let search = SearchRequest {
            base_dn: request.base.clone(),
            scope: convert_scope(&request.scope),
            filter: convert_filter(&request.filter),
            attributes: request.attrs.clone(),
            size_limit: usize::try_from(request.sizelimit).unwrap_or(0),
        };
        debug!(bound_dn = %self.bound_dn, base = %search.base_dn, filter = ?search.filter, "Search request");

        let result = match self.bridge.search(&self.bound_dn, &search).await {
            Ok(result) => result,
            Err(e) => {
                return vec![LdapOp::SearchResultDone(ldap_result(
                    ldap_code(e.result_code()),
                    e.to_string(),
                ))]
            }
        };

        let base = CanonicalName::parse(&search.base_dn);
        let mut ops = Vec::new();
        let mut done_code = ldap_code(result.result_code);

        let matching = result
            .entries
            .iter()
            .filter(|entry| in_scope(&entry.dn, &base, search.scope))
            .filter(|entry| search.filter.matches(entry));

        for (returned, entry) in matching.enumerate() {
            if search.size_limit > 0 && returned == search.size_limit {
                warn!(limit = search.size_limit, "Search size limit exceeded");
                done_code = LdapResultCode::SizeLimitExceeded;
                break;
            }
            ops.push(LdapOp::SearchResultEntry(project(
                entry,
                &search.attributes,
                request.typesonly,
            )));
        }

        debug!(entries = ops.len(), "Search completed");
        ops.push(LdapOp::SearchResultDone(ldap_result(done_code, "")));
        ops
    }

    /// Tear down the session
    pub async fn close(&mut self) {
        if let Err(e) = self.bridge.close(&self.bound_dn).await {
            warn!(error = %e, "Close hook failed");
        }
        self.bound_dn.clear();
    }
}
