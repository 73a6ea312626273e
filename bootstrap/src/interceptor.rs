//! gRPC Interceptors
//!
//! 从 metadata 提取请求上下文，存入请求扩展

use bridge_common::RequestContext;
use tonic::metadata::MetadataMap;
use tonic::{Request, Status};

pub const SESSION_HEADER: &str = "x-session-id";
pub const CLIENT_HEADER: &str = "x-client-id";
pub const ORG_HEADER: &str = "x-org-id";
pub const ROLE_HEADER: &str = "x-role-id";
pub const USER_HEADER: &str = "x-user-id";
pub const LANGUAGE_HEADER: &str = "x-language";

#[allow(clippy::result_large_err)]
fn header<'a>(metadata: &'a MetadataMap, name: &str) -> Result<&'a str, Status> {
    let value = metadata
        .get(name)
        .ok_or_else(|| Status::unauthenticated(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| Status::unauthenticated(format!("Invalid {} header", name)))?
        .trim();
    if value.is_empty() {
        return Err(Status::unauthenticated(format!("Empty {} header", name)));
    }
    Ok(value)
}

#[allow(clippy::result_large_err)]
fn id_header(metadata: &MetadataMap, name: &str) -> Result<i64, Status> {
    header(metadata, name)?
        .parse::<i64>()
        .ok()
        .filter(|id| *id >= 0)
        .ok_or_else(|| Status::unauthenticated(format!("Invalid {} header", name)))
}

/// 解析请求上下文
#[allow(clippy::result_large_err)]
pub fn extract_context(metadata: &MetadataMap) -> Result<RequestContext, Status> {
    let ctx = RequestContext::new(
        header(metadata, SESSION_HEADER)?,
        id_header(metadata, CLIENT_HEADER)?,
        id_header(metadata, ORG_HEADER)?,
        id_header(metadata, ROLE_HEADER)?,
        id_header(metadata, USER_HEADER)?,
    );
    Ok(match header(metadata, LANGUAGE_HEADER) {
        Ok(language) => ctx.with_language(language),
        Err(_) => ctx,
    })
}

/// 上下文拦截器
#[allow(clippy::result_large_err)]
pub fn context_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    let ctx = extract_context(request.metadata())?;
    request.extensions_mut().insert(ctx);
    Ok(request)
}

/// 从请求扩展中取出上下文（拦截器未运行时回退为直接解析 metadata）
#[allow(clippy::result_large_err)]
pub fn request_context<T>(request: &Request<T>) -> Result<RequestContext, Status> {
    match request.extensions().get::<RequestContext>() {
        Some(ctx) => Ok(ctx.clone()),
        None => extract_context(request.metadata()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&'static str, &'static str)]) -> Request<()> {
        let mut request = Request::new(());
        for (name, value) in headers {
            request.metadata_mut().insert(*name, value.parse().unwrap());
        }
        request
    }

    const FULL: [(&str, &str); 5] = [
        ("x-session-id", "sess-42"),
        ("x-client-id", "11"),
        ("x-org-id", "0"),
        ("x-role-id", "102"),
        ("x-user-id", "100"),
    ];

    #[test]
    fn test_interceptor_stores_context() {
        let request = context_interceptor(request(&FULL)).unwrap();
        let ctx = request_context(&request).unwrap();
        assert_eq!(ctx, RequestContext::new("sess-42", 11, 0, 102, 100));
        assert_eq!(ctx.language, "en_US");
    }

    #[test]
    fn test_language_header() {
        let mut headers = FULL.to_vec();
        headers.push(("x-language", "es_MX"));
        let ctx = request_context(&request(&headers)).unwrap();
        assert_eq!(ctx.language, "es_MX");
    }

    #[test]
    fn test_missing_session_is_unauthenticated() {
        let status = context_interceptor(request(&FULL[1..])).unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);
        assert!(status.message().contains("x-session-id"));
    }

    #[test]
    fn test_malformed_ids() {
        for bad in ["abc", "-1", " "] {
            let mut headers = FULL.to_vec();
            headers[1] = ("x-client-id", bad);
            let status = context_interceptor(request(&headers)).unwrap_err();
            assert_eq!(status.code(), tonic::Code::Unauthenticated);
        }
    }
}
