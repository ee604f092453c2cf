#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::helpers::app::{ROOM_SSID, TestApp, make_test_app, request, token_for};

    async fn check_in_student(app: &TestApp) {
        let token = token_for(&app.student);
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
        });
        let (status, _) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn owner_reads_todays_aggregate() {
        let app = make_test_app().await;
        check_in_student(&app).await;
        let token = token_for(&app.owner);

        let uri = format!("/api/attendance/sessions/{}/aggregate", app.session.id);
        let (status, json) = app.send(request("GET", &uri, Some(&token), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["day"], "2025-03-03");
        assert_eq!(json["data"]["enrolled"], 1);
        assert_eq!(json["data"]["present"], 1);
        assert_eq!(json["data"]["rate"], 1.0);
    }

    #[tokio::test]
    async fn aggregate_for_another_day_is_recounted() {
        let app = make_test_app().await;
        check_in_student(&app).await;
        let token = token_for(&app.owner);

        let uri = format!(
            "/api/attendance/sessions/{}/aggregate?day=2025-03-04",
            app.session.id
        );
        let (status, json) = app.send(request("GET", &uri, Some(&token), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["present"], 0);
        assert_eq!(json["data"]["rate"], 0.0);
    }

    #[tokio::test]
    async fn student_cannot_read_aggregate() {
        let app = make_test_app().await;
        let token = token_for(&app.student);

        let uri = format!("/api/attendance/sessions/{}/aggregate", app.session.id);
        let (status, json) = app.send(request("GET", &uri, Some(&token), None)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["data"]["kind"], "SESSION_NOT_OWNED");
    }

    #[tokio::test]
    async fn admin_lists_session_records() {
        let app = make_test_app().await;
        check_in_student(&app).await;
        let token = token_for(&app.admin);

        let uri = format!("/api/attendance/sessions/{}/records", app.session.id);
        let (status, json) = app.send(request("GET", &uri, Some(&token), None)).await;

        assert_eq!(status, StatusCode::OK);
        let records = json["data"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["userId"], app.student.id);
        assert_eq!(records[0]["verification"]["wifi"]["matched"], true);
    }

    #[tokio::test]
    async fn records_filtered_by_day() {
        let app = make_test_app().await;
        check_in_student(&app).await;
        let token = token_for(&app.owner);

        let uri = format!(
            "/api/attendance/sessions/{}/records?day=2025-03-02",
            app.session.id
        );
        let (status, json) = app.send(request("GET", &uri, Some(&token), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_session_records_are_not_found() {
        let app = make_test_app().await;
        let token = token_for(&app.owner);

        let (status, _) = app
            .send(request("GET", "/api/attendance/sessions/424242/records", Some(&token), None))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
