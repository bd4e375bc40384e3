use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use uuid::Uuid;

use nutrifit_shared::clients::db;
use nutrifit_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::Exercise;
use crate::schema::exercises;

/// Catalog filters accepted by `GET /exercise`.
#[derive(Debug, Default, Clone)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub muscle: Option<String>,
    pub search: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Published exercises plus the caller's own custom ones, narrowed by `filter`.
pub fn catalog_query(user_id: Uuid, filter: &CatalogFilter) -> exercises::BoxedQuery<'static, Pg> {
    let mut query = exercises::table
        .filter(exercises::status.eq(true))
        .filter(
            exercises::is_published
                .eq(true)
                .or(exercises::created_by_user_id.eq(user_id)),
        )
        .into_boxed();

    if let Some(category) = non_blank(&filter.category) {
        query = query.filter(exercises::category.ilike(db::escape_like(&category)));
    }
    if let Some(muscle) = non_blank(&filter.muscle) {
        let muscle = muscle.to_lowercase();
        query = query.filter(
            exercises::primary_muscles
                .contains(vec![muscle.clone()])
                .or(exercises::secondary_muscles.contains(vec![muscle])),
        );
    }
    if let Some(search) = non_blank(&filter.search) {
        query = query.filter(exercises::name.ilike(db::contains_pattern(&search)));
    }
    query
}

/// An exercise the user may see: published, or their own.
pub fn find_visible_exercise(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> AppResult<Exercise> {
    exercises::table
        .find(id)
        .filter(exercises::status.eq(true))
        .filter(
            exercises::is_published
                .eq(true)
                .or(exercises::created_by_user_id.eq(user_id)),
        )
        .select(Exercise::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ExerciseNotFound, "exercise not found"))
}

/// An exercise the user created; catalog entries without a creator are read-only.
pub fn find_own_exercise(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> AppResult<Exercise> {
    let exercise = find_visible_exercise(conn, id, user_id)?;
    if exercise.created_by_user_id != Some(user_id) {
        return Err(AppError::new(ErrorCode::NotExerciseOwner, "only the creator can change this exercise"));
    }
    Ok(exercise)
}

/// Checks that every id refers to an exercise visible to `user_id`.
pub fn ensure_usable(conn: &mut PgConnection, ids: &[Uuid], user_id: Uuid) -> AppResult<()> {
    let mut wanted = ids.to_vec();
    wanted.sort_unstable();
    wanted.dedup();
    let expected = wanted.len();

    let found: i64 = exercises::table
        .filter(exercises::id.eq_any(wanted))
        .filter(exercises::status.eq(true))
        .filter(
            exercises::is_published
                .eq(true)
                .or(exercises::created_by_user_id.eq(user_id)),
        )
        .count()
        .get_result(conn)?;

    if found as usize != expected {
        return Err(AppError::new(ErrorCode::ExerciseNotFound, "one or more exercises do not exist"));
    }
    Ok(())
}

/// Muscle names are matched case-insensitively, so they are stored lower-cased.
pub fn normalize_muscles(muscles: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(muscles.len());
    for m in muscles {
        let m = m.trim().to_lowercase();
        if !m.is_empty() && !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn muscles_are_trimmed_lowercased_and_deduplicated() {
        let input = vec![" Chest".to_string(), "triceps".into(), "CHEST".into(), "  ".into()];
        assert_eq!(normalize_muscles(&input), vec!["chest".to_string(), "triceps".to_string()]);
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&Some(" legs ".into())), Some("legs".into()));
        assert_eq!(non_blank(&None), None);
    }

    #[test]
    fn search_wildcards_match_literally() {
        let Some(mut conn) = test_support::db() else { return };
        let bench = test_support::exercise(&mut conn, "Bench press");
        let user_id = Uuid::new_v4();

        let ids = |conn: &mut PgConnection, search: &str| -> Vec<Uuid> {
            let filter = CatalogFilter { search: Some(search.to_string()), ..Default::default() };
            catalog_query(user_id, &filter).select(exercises::id).load(conn).unwrap()
        };

        assert!(ids(&mut conn, "bench").contains(&bench.id));
        assert!(!ids(&mut conn, "%").contains(&bench.id));
        assert!(!ids(&mut conn, "Bench_press").contains(&bench.id));
    }
}
