use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

/// Status and decoded JSON body of an API call (`Null` for empty bodies)
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn id(&self) -> String {
        self.body["id"].as_str().unwrap().to_string()
    }
}

/// Points of a participant in a serialized quiniela
pub fn points_of(quiniela: &Value, user_id: &str) -> u64 {
    quiniela["participants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["userId"] == user_id)
        .and_then(|p| p["points"].as_u64())
        .unwrap_or_else(|| panic!("{} is not a participant", user_id))
}

// ============================================================================
// API actions, each sent with the given user's bearer token
// ============================================================================

impl TestSetup {
    pub async fn send(&self, method: &str, uri: &str, user_id: &str, body: Option<Value>) -> ApiResponse {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", self.token_for(user_id)));

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        ApiResponse { status, body }
    }

    pub async fn create_quiniela(&self, user_id: &str, name: &str) -> ApiResponse {
        self.send("POST", "/quinielas", user_id, Some(json!({ "name": name })))
            .await
    }

    pub async fn get_quiniela(&self, user_id: &str, quiniela_id: &str) -> ApiResponse {
        self.send("GET", &format!("/quinielas/{}", quiniela_id), user_id, None)
            .await
    }

    pub async fn add_match(
        &self,
        user_id: &str,
        quiniela_id: &str,
        home_team: &str,
        away_team: &str,
        date: DateTime<Utc>,
    ) -> ApiResponse {
        self.send(
            "POST",
            &format!("/quinielas/{}/matches", quiniela_id),
            user_id,
            Some(json!({ "homeTeam": home_team, "awayTeam": away_team, "date": date })),
        )
        .await
    }

    pub async fn remove_match(&self, user_id: &str, quiniela_id: &str, match_id: &str) -> ApiResponse {
        self.send(
            "DELETE",
            &format!("/quinielas/{}/matches/{}", quiniela_id, match_id),
            user_id,
            None,
        )
        .await
    }

    pub async fn record_result(
        &self,
        user_id: &str,
        quiniela_id: &str,
        match_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> ApiResponse {
        self.send(
            "PUT",
            &format!("/quinielas/{}/matches/{}/result", quiniela_id, match_id),
            user_id,
            Some(json!({ "homeScore": home_score, "awayScore": away_score })),
        )
        .await
    }

    pub async fn join(&self, user_id: &str, quiniela_id: &str) -> ApiResponse {
        self.send(
            "POST",
            &format!("/quinielas/{}/participants", quiniela_id),
            user_id,
            None,
        )
        .await
    }

    pub async fn leave(&self, user_id: &str, quiniela_id: &str) -> ApiResponse {
        self.send(
            "DELETE",
            &format!("/quinielas/{}/participants", quiniela_id),
            user_id,
            None,
        )
        .await
    }

    pub async fn predict(
        &self,
        user_id: &str,
        quiniela_id: &str,
        match_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> ApiResponse {
        self.send(
            "PUT",
            &format!("/quinielas/{}/predictions", quiniela_id),
            user_id,
            Some(json!({ "matchId": match_id, "homeScore": home_score, "awayScore": away_score })),
        )
        .await
    }

    pub async fn leaderboard(&self, user_id: &str, quiniela_id: &str) -> ApiResponse {
        self.send(
            "GET",
            &format!("/quinielas/{}/leaderboard", quiniela_id),
            user_id,
            None,
        )
        .await
    }

    pub async fn global_leaderboard(&self, user_id: &str) -> ApiResponse {
        self.send("GET", "/leaderboard", user_id, None).await
    }

    pub async fn user_stats(&self, user_id: &str, subject: &str) -> ApiResponse {
        self.send("GET", &format!("/users/{}/stats", subject), user_id, None)
            .await
    }
}
