use axum::http::{HeaderMap, HeaderValue, header};
use heritage_portal::guard::{self, GuardOutcome, Target, evaluate};
use heritage_portal::models::Role;
use heritage_portal::resolver::Verdict;
use uuid::Uuid;

fn authenticated(role: Option<Role>) -> Verdict {
    Verdict::Authenticated {
        uid: Uuid::new_v4(),
        role,
    }
}

#[cfg(test)]
mod evaluate_tests {
    use super::*;

    #[test]
    fn unresolved_verdict_blocks_on_loading() {
        assert_eq!(evaluate(&Verdict::Unresolved, Role::User), GuardOutcome::Loading);
        assert_eq!(evaluate(&Verdict::Unresolved, Role::Admin), GuardOutcome::Loading);
    }

    #[test]
    fn no_session_redirects_to_login() {
        assert_eq!(
            evaluate(&Verdict::Unauthenticated, Role::User),
            GuardOutcome::Redirect(Target::Login)
        );
        assert_eq!(
            evaluate(&Verdict::Unauthenticated, Role::Admin),
            GuardOutcome::Redirect(Target::Login)
        );
    }

    #[test]
    fn matching_role_renders() {
        assert_eq!(
            evaluate(&authenticated(Some(Role::User)), Role::User),
            GuardOutcome::Render
        );
        assert_eq!(
            evaluate(&authenticated(Some(Role::Admin)), Role::Admin),
            GuardOutcome::Render
        );
    }

    #[test]
    fn mismatched_role_redirects_to_its_own_home() {
        // An admin on a user page belongs on the admin console.
        assert_eq!(
            evaluate(&authenticated(Some(Role::Admin)), Role::User),
            GuardOutcome::Redirect(Target::AdminHome)
        );
        // A user on an admin page belongs on the user dashboard.
        assert_eq!(
            evaluate(&authenticated(Some(Role::User)), Role::Admin),
            GuardOutcome::Redirect(Target::UserHome)
        );
    }

    #[test]
    fn undetermined_role_is_treated_like_no_session() {
        assert_eq!(
            evaluate(&authenticated(None), Role::User),
            GuardOutcome::Redirect(Target::Login)
        );
        assert_eq!(
            evaluate(&authenticated(None), Role::Admin),
            GuardOutcome::Redirect(Target::Login)
        );
    }
}

#[cfg(test)]
mod entry_tests {
    use super::*;

    #[test]
    fn anonymous_entry_renders_the_login_surface() {
        assert_eq!(guard::entry_target(&Verdict::Unauthenticated), None);
        assert_eq!(guard::entry_target(&Verdict::Unresolved), None);
    }

    #[test]
    fn entry_routes_each_role_to_its_home() {
        assert_eq!(
            guard::entry_target(&authenticated(Some(Role::Admin))),
            Some(Target::AdminHome)
        );
        assert_eq!(
            guard::entry_target(&authenticated(Some(Role::User))),
            Some(Target::UserHome)
        );
        // A session with no determined role still gets the user dashboard,
        // mirroring the sign-in landing policy.
        assert_eq!(
            guard::entry_target(&authenticated(None)),
            Some(Target::UserHome)
        );
    }

    #[test]
    fn target_paths_are_stable() {
        assert_eq!(Target::Login.path(), "/");
        assert_eq!(Target::AdminHome.path(), "/admin");
        assert_eq!(Target::UserHome.path(), "/user");
    }
}

#[cfg(test)]
mod bearer_tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted_from_the_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(guard::bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(guard::bearer_token(&headers), None);
        assert_eq!(guard::bearer_token(&HeaderMap::new()), None);
    }
}
