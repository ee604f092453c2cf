#[cfg(test)]
mod tests {
    use crate::helpers::app::{make_test_app, request};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_check_is_public() {
        let app = make_test_app().await;

        let (status, json) = app.send(request("GET", "/api/health", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "OK");
        assert_eq!(json["message"], "Health check passed");
    }
}
