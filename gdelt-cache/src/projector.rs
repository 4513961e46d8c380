//! `ArticleProjector` — stored row to public JSON shape. Never inspects
//! `payload` beyond passing it through.

use gdelt_core::{ArticleProjection, ArticleRow};

pub struct ArticleProjector;

impl ArticleProjector {
    pub fn project(row: &ArticleRow) -> ArticleProjection {
        ArticleProjection::from(row)
    }

    pub fn project_all(rows: &[ArticleRow]) -> Vec<ArticleProjection> {
        rows.iter().map(Self::project).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn projection_passes_payload_through_untouched() {
        let payload = serde_json::json!({"tone": -1.2, "themes": ["ECON"]});
        let row = ArticleRow {
            gkg_record_id: "abc".to_string(),
            country_code: "CH".parse().unwrap(),
            date_added: 20260121120000,
            created_at: Utc::now(),
            payload: payload.clone(),
        };

        let projection = ArticleProjector::project(&row);
        assert_eq!(projection.gkg_record_id, "abc");
        assert_eq!(projection.country_code, "CH");
        assert_eq!(projection.payload, payload);
    }
}
