use axum::{extract::Request, middleware::Next, response::Response};

use crate::recorder::RequestUser;

/// Stand-in auth layer for the demo server.
///
/// Resolves `X-Demo-User: member | staff | superuser` into a
/// [`RequestUser`]; anything else stays anonymous.
pub async fn demo_user(mut req: Request, next: Next) -> Response {
    let user = req
        .headers()
        .get("x-demo-user")
        .and_then(|v| v.to_str().ok())
        .map(resolve)
        .unwrap_or_default();
    req.extensions_mut().insert(user);
    next.run(req).await
}

fn resolve(role: &str) -> RequestUser {
    match role.trim() {
        "member" => RequestUser::member(),
        "staff" => RequestUser::staff(),
        "superuser" => RequestUser::superuser(),
        _ => RequestUser::anonymous(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_users() {
        assert_eq!(resolve("staff"), RequestUser::staff());
        assert!(resolve("superuser").superuser);
        assert!(!resolve("root").authenticated);
    }
}
