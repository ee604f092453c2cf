#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Duration;
    use db::models::enrollment;
    use futures::future::join_all;
    use serde_json::json;

    use crate::helpers::app::{ROOM_SSID, make_test_app, request, token_for};

    // ---------------------------
    // check-in
    // ---------------------------

    #[tokio::test]
    async fn wifi_check_in_creates_present_record() {
        let app = make_test_app().await;
        let token = token_for(&app.student);

        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
        });
        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "PRESENT");
        assert_eq!(json["data"]["method"], "WIFI");
        assert_eq!(json["data"]["userId"], app.student.id);
        assert_eq!(json["data"]["day"], "2025-03-03");
    }

    #[tokio::test]
    async fn check_in_without_token_is_unauthorized() {
        let app = make_test_app().await;
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
        });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", None, Some(body)))
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn check_in_with_forged_token_is_unauthorized() {
        let app = make_test_app().await;
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
        });

        let (status, _) = app
            .send(request("POST", "/api/attendance/check-in", Some("not.a.jwt"), Some(body)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn outsider_is_forbidden() {
        let app = make_test_app().await;
        let token = token_for(&app.outsider);
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
        });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["data"]["kind"], "NOT_ENROLLED");
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = make_test_app().await;
        let token = token_for(&app.student);
        let body = json!({ "sessionId": 9999, "method": "WIFI", "observedSSID": ROOM_SSID });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["data"]["kind"], "SESSION_INACTIVE");
    }

    #[tokio::test]
    async fn second_check_in_is_rejected_as_duplicate() {
        let app = make_test_app().await;
        let token = token_for(&app.student);
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
        });

        let (first, _) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body.clone())))
            .await;
        let (second, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::BAD_REQUEST);
        assert_eq!(json["data"]["kind"], "DUPLICATE_CHECK_IN");
    }

    #[tokio::test]
    async fn face_mismatch_reports_confidence() {
        let app = make_test_app().await;
        let token = token_for(&app.student);
        let body = json!({
            "sessionId": app.session.id,
            "method": "FACE",
            "faceSample": [0.9, 0.9, 0.9],
        });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["data"]["kind"], "FACE_MISMATCH");
        assert!(json["data"]["confidence"].is_number());
        assert!(json["data"]["distance"].as_f64().unwrap() > 0.6);
    }

    #[tokio::test]
    async fn wrong_network_is_location_mismatch() {
        let app = make_test_app().await;
        let token = token_for(&app.student);
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": "eduroam",
        });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["data"]["kind"], "LOCATION_MISMATCH");
        assert_eq!(json["data"]["confidence"], 0.0);
    }

    #[tokio::test]
    async fn empty_ssid_fails_validation() {
        let app = make_test_app().await;
        let token = token_for(&app.student);
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": "",
        });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "observedSSID must be 1-32 characters");
    }

    #[tokio::test]
    async fn out_of_range_coordinates_fail_validation() {
        let app = make_test_app().await;
        let token = token_for(&app.student);
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
            "coordinates": { "latitude": 200.0, "longitude": 28.23 },
        });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "latitude must be between -90 and 90");
    }

    #[tokio::test]
    async fn check_in_after_grace_is_out_of_window() {
        let app = make_test_app().await;
        app.clock.advance(Duration::minutes(70) + Duration::seconds(1));
        let token = token_for(&app.student);
        let body = json!({
            "sessionId": app.session.id,
            "method": "WIFI",
            "observedSSID": ROOM_SSID,
        });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["data"]["kind"], "OUT_OF_WINDOW");
    }

    // ---------------------------
    // QR issue / redeem
    // ---------------------------

    async fn issue(app: &crate::helpers::TestApp, ttl: u64) -> String {
        let token = token_for(&app.owner);
        let body = json!({ "sessionId": app.session.id, "ttlSeconds": ttl });
        let (status, json) = app
            .send(request("POST", "/api/attendance/qr/issue", Some(&token), Some(body)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["data"]["token"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn owner_issues_qr_token() {
        let app = make_test_app().await;
        let token = token_for(&app.owner);
        let body = json!({ "sessionId": app.session.id, "ttlSeconds": 300 });

        let (status, json) = app
            .send(request("POST", "/api/attendance/qr/issue", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["token"].as_str().unwrap().len(), 64);
        assert_eq!(json["data"]["sessionId"], app.session.id);
        assert_eq!(json["data"]["expiresAt"], "2025-03-03T10:10:00+00:00");
    }

    #[tokio::test]
    async fn admin_may_issue_for_any_session() {
        let app = make_test_app().await;
        let token = token_for(&app.admin);
        let body = json!({ "sessionId": app.session.id, "ttlSeconds": 60 });

        let (status, _) = app
            .send(request("POST", "/api/attendance/qr/issue", Some(&token), Some(body)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn student_cannot_issue_qr_token() {
        let app = make_test_app().await;
        let token = token_for(&app.student);
        let body = json!({ "sessionId": app.session.id, "ttlSeconds": 300 });

        let (status, json) = app
            .send(request("POST", "/api/attendance/qr/issue", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["data"]["kind"], "SESSION_NOT_OWNED");
    }

    #[tokio::test]
    async fn zero_ttl_fails_validation() {
        let app = make_test_app().await;
        let token = token_for(&app.owner);
        let body = json!({ "sessionId": app.session.id, "ttlSeconds": 0 });

        let (status, json) = app
            .send(request("POST", "/api/attendance/qr/issue", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "ttlSeconds must be between 1 and 86400");
    }

    #[tokio::test]
    async fn qr_token_redeems_exactly_once() {
        let app = make_test_app().await;
        let qr = issue(&app, 300).await;
        let token = token_for(&app.student);

        let (first, json) = app
            .send(request(
                "POST",
                "/api/attendance/qr/redeem",
                Some(&token),
                Some(json!({ "token": qr })),
            ))
            .await;
        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(json["data"]["method"], "QR");

        let (second, json) = app
            .send(request(
                "POST",
                "/api/attendance/qr/redeem",
                Some(&token),
                Some(json!({ "token": qr })),
            ))
            .await;
        assert_eq!(second, StatusCode::BAD_REQUEST);
        assert_eq!(json["data"]["kind"], "TOKEN_NOT_FOUND");
    }

    #[tokio::test]
    async fn qr_token_past_ttl_is_rejected() {
        let app = make_test_app().await;
        let qr = issue(&app, 300).await;
        app.clock.advance(Duration::seconds(301));
        let token = token_for(&app.student);

        let (status, json) = app
            .send(request(
                "POST",
                "/api/attendance/qr/redeem",
                Some(&token),
                Some(json!({ "token": qr })),
            ))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let kind = json["data"]["kind"].as_str().unwrap();
        assert!(kind == "TOKEN_NOT_FOUND" || kind == "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn qr_check_in_through_check_in_endpoint() {
        let app = make_test_app().await;
        let qr = issue(&app, 300).await;
        let token = token_for(&app.student);
        let body = json!({ "sessionId": app.session.id, "method": "QR", "qrToken": qr });

        let (status, json) = app
            .send(request("POST", "/api/attendance/check-in", Some(&token), Some(body)))
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["method"], "QR");
    }

    #[tokio::test]
    async fn concurrent_redemptions_have_one_winner() {
        let app = make_test_app().await;
        let mut students = vec![app.student.clone()];
        for i in 0..4 {
            let user = db::models::user::Model::create(
                &app.db,
                &format!("racer{i}"),
                &format!("racer{i}@test.com"),
                false,
            )
            .await
            .unwrap();
            enrollment::Model::enroll(&app.db, user.id, app.course.id)
                .await
                .unwrap();
            students.push(user);
        }
        let qr = issue(&app, 300).await;

        let attempts = students.iter().map(|s| {
            app.send(request(
                "POST",
                "/api/attendance/qr/redeem",
                Some(&token_for(s)),
                Some(json!({ "token": qr })),
            ))
        });
        let results = join_all(attempts).await;

        let created = results
            .iter()
            .filter(|(status, _)| *status == StatusCode::CREATED)
            .count();
        assert_eq!(created, 1);
        assert!(
            results
                .iter()
                .filter(|(status, _)| *status != StatusCode::CREATED)
                .all(|(status, _)| *status == StatusCode::BAD_REQUEST)
        );
    }
}
