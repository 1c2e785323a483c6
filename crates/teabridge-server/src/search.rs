//! Wire conversions and post-processing of search results

use ldap3_server::proto::{
    LdapFilter, LdapPartialAttribute, LdapResult, LdapResultCode, LdapSearchResultEntry,
    LdapSearchScope,
};
use teabridge_core::ResultCode;
use teabridge_directory::{CanonicalName, DirectoryEntry, Filter, SearchScope};

/// Requested attribute list meaning "no attributes"
const NO_ATTRIBUTES: &str = "1.1";

pub fn ldap_code(code: ResultCode) -> LdapResultCode {
    match code {
        ResultCode::Success => LdapResultCode::Success,
        ResultCode::OperationsError => LdapResultCode::OperationsError,
        ResultCode::InvalidDnSyntax => LdapResultCode::InvalidDNSyntax,
        ResultCode::InvalidCredentials => LdapResultCode::InvalidCredentials,
        ResultCode::InsufficientAccessRights => LdapResultCode::InsufficentAccessRights,
        ResultCode::UnwillingToPerform => LdapResultCode::UnwillingToPerform,
        ResultCode::Other => LdapResultCode::Other,
    }
}

pub fn ldap_result(code: LdapResultCode, message: impl Into<String>) -> LdapResult {
    LdapResult {
        code,
        matcheddn: String::new(),
        message: message.into(),
        referral: vec![],
    }
}

pub fn convert_scope(scope: &LdapSearchScope) -> SearchScope {
    match scope {
        LdapSearchScope::Base => SearchScope::Base,
        LdapSearchScope::OneLevel => SearchScope::OneLevel,
        _ => SearchScope::Subtree,
    }
}

pub fn convert_filter(filter: &LdapFilter) -> Filter {
    match filter {
        LdapFilter::And(filters) => Filter::And(filters.iter().map(convert_filter).collect()),
        LdapFilter::Or(filters) => Filter::Or(filters.iter().map(convert_filter).collect()),
        LdapFilter::Not(inner) => Filter::Not(Box::new(convert_filter(inner))),
        LdapFilter::Equality(attr, value) => Filter::Equality(attr.clone(), value.clone()),
        LdapFilter::Present(attr) => Filter::Present(attr.clone()),
        LdapFilter::Substring(attr, sub) => Filter::Substring {
            attribute: attr.clone(),
            initial: sub.initial.clone(),
            any: sub.any.clone(),
            final_: sub.final_.clone(),
        },
        #[allow(unreachable_patterns)]
        other => Filter::Unsupported(format!("{:?}", other)),
    }
}

/// Whether `dn` falls inside the searched part of the tree
pub fn in_scope(dn: &str, base: &CanonicalName, scope: SearchScope) -> bool {
    let dn = CanonicalName::parse(dn);
    match scope {
        SearchScope::Base => dn.eq_ignore_case(base),
        SearchScope::Subtree => dn.is_within(base),
        SearchScope::OneLevel => {
            if !dn.is_within(base) || dn.eq_ignore_case(base) {
                return false;
            }
            // `dn` ends with ",<base>"; the rest must be a single RDN
            dn.as_str()
                .len()
                .checked_sub(base.as_str().len() + 1)
                .and_then(|rdn_len| dn.as_str().get(..rdn_len))
                .map(|rdn| !rdn.contains(','))
                .unwrap_or(false)
        }
    }
}

/// Build the wire entry, keeping only the requested attributes
pub fn project(entry: &DirectoryEntry, requested: &[String], types_only: bool) -> LdapSearchResultEntry {
    let all = requested.is_empty() || requested.iter().any(|a| a == "*");
    let none = !all && requested.iter().all(|a| a == NO_ATTRIBUTES);

    let attributes = entry
        .attributes
        .iter()
        .filter(|attr| {
            !none && (all || requested.iter().any(|r| r.eq_ignore_ascii_case(&attr.name)))
        })
        .map(|attr| LdapPartialAttribute {
            atype: attr.name.clone(),
            vals: if types_only {
                vec![]
            } else {
                attr.values.clone()
            },
        })
        .collect();

    LdapSearchResultEntry {
        dn: entry.dn.clone(),
        attributes,
    }
}
