// Tests for database functionality

use chrono::Duration;
use linkrecovery_core::data::{DEMO_EMAIL, Database};
use linkrecovery_core::model::{ErrorRecord, ErrorStatus, Recommendation, ScanStatus, ScanType};
use tempfile::TempDir;

fn create_test_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).unwrap();
    (temp_dir, db)
}

fn seed_error(db: &Database, site_id: &str, url: &str, score: u32, backlinks: u32) -> ErrorRecord {
    let mut record = ErrorRecord::new(site_id, url);
    record.priority_score = score;
    record.backlink_count = backlinks;
    db.insert_error(&record).unwrap();
    record
}

// ============================================================================
// Database Creation Tests
// ============================================================================

#[test]
fn test_database_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path);
    assert!(db.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_database_exists_and_drop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    assert!(!Database::exists(&db_path));
    let db = Database::new(&db_path).unwrap();
    assert!(Database::exists(&db_path));

    drop(db);
    Database::drop(&db_path).unwrap();
    assert!(!Database::exists(&db_path));
}

// ============================================================================
// User and Session Tests
// ============================================================================

#[test]
fn test_upsert_user_is_idempotent() {
    let (_temp_dir, db) = create_test_db();

    let first = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let second = db.upsert_user_by_email(DEMO_EMAIL).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(db.get_user(&first.id).unwrap().unwrap().email, DEMO_EMAIL);
}

#[test]
fn test_session_lifecycle() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();

    let token = db.create_session(&user.id, Duration::minutes(30)).unwrap();
    assert_eq!(db.session_user(&token).unwrap(), Some(user.id.clone()));

    assert!(db.delete_session(&token).unwrap());
    assert_eq!(db.session_user(&token).unwrap(), None);
}

#[test]
fn test_expired_session_is_rejected() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();

    let token = db.create_session(&user.id, Duration::seconds(-5)).unwrap();
    assert_eq!(db.session_user(&token).unwrap(), None);
}

// ============================================================================
// Site Tests
// ============================================================================

#[test]
fn test_create_and_list_sites() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();

    let site = db.create_site(&user.id, "https://example.com").unwrap();
    assert_eq!(site.site_type, "url-prefix");
    assert_eq!(site.permission_level, "owner");
    assert!(site.last_scan.is_none());

    let sites = db.list_sites(&user.id).unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].site_url, "https://example.com");

    let found = db.find_site_by_url(&user.id, "https://example.com").unwrap();
    assert_eq!(found.map(|s| s.id), Some(site.id));
}

#[test]
fn test_duplicate_site_is_rejected_by_schema() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();

    db.create_site(&user.id, "https://example.com").unwrap();
    assert!(db.create_site(&user.id, "https://example.com").is_err());
}

#[test]
fn test_get_site_checks_ownership() {
    let (_temp_dir, db) = create_test_db();
    let owner = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let other = db.upsert_user_by_email("other@example.com").unwrap();

    let site = db.create_site(&owner.id, "https://example.com").unwrap();

    assert!(db.get_site(&owner.id, &site.id).unwrap().is_some());
    assert!(db.get_site(&other.id, &site.id).unwrap().is_none());
}

#[test]
fn test_touch_last_scan() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();

    db.touch_last_scan(&site.id).unwrap();

    let reloaded = db.get_site(&user.id, &site.id).unwrap().unwrap();
    assert!(reloaded.last_scan.is_some());
}

// ============================================================================
// Broken URL Tests
// ============================================================================

#[test]
fn test_list_errors_orders_by_priority() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();

    seed_error(&db, &site.id, "https://example.com/old-product-page", 75, 5);
    seed_error(&db, &site.id, "https://example.com/deleted-blog-post", 90, 12);
    seed_error(&db, &site.id, "https://example.com/missing-category", 60, 3);

    let errors = db.list_errors(&user.id, None, None).unwrap();
    let scores: Vec<u32> = errors.iter().map(|e| e.priority_score).collect();
    assert_eq!(scores, vec![90, 75, 60]);
}

#[test]
fn test_list_errors_filters_by_status_and_site() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site_a = db.create_site(&user.id, "https://a.example").unwrap();
    let site_b = db.create_site(&user.id, "https://b.example").unwrap();

    let fixed = seed_error(&db, &site_a.id, "https://a.example/x", 10, 0);
    seed_error(&db, &site_a.id, "https://a.example/y", 20, 0);
    seed_error(&db, &site_b.id, "https://b.example/z", 30, 0);
    db.update_error_status(&fixed.id, ErrorStatus::Fixed).unwrap();

    let new_errors = db.list_errors(&user.id, None, Some(ErrorStatus::New)).unwrap();
    assert_eq!(new_errors.len(), 2);

    let site_a_errors = db.list_errors(&user.id, Some(&site_a.id), None).unwrap();
    assert_eq!(site_a_errors.len(), 2);

    let fixed_a = db
        .list_errors(&user.id, Some(&site_a.id), Some(ErrorStatus::Fixed))
        .unwrap();
    assert_eq!(fixed_a.len(), 1);
    assert_eq!(fixed_a[0].url, "https://a.example/x");
}

#[test]
fn test_list_errors_is_scoped_to_user() {
    let (_temp_dir, db) = create_test_db();
    let owner = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let other = db.upsert_user_by_email("other@example.com").unwrap();
    let site = db.create_site(&owner.id, "https://example.com").unwrap();
    seed_error(&db, &site.id, "https://example.com/gone", 50, 1);

    assert!(db.list_errors(&other.id, None, None).unwrap().is_empty());
}

#[test]
fn test_status_can_move_in_any_direction() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();
    let record = seed_error(&db, &site.id, "https://example.com/gone", 50, 1);

    for status in [ErrorStatus::Ignored, ErrorStatus::Fixed, ErrorStatus::New] {
        assert!(db.update_error_status(&record.id, status).unwrap());
        assert_eq!(db.get_error(&record.id).unwrap().unwrap().status, status);
    }
}

#[test]
fn test_refresh_error_updates_metrics() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();
    let record = seed_error(&db, &site.id, "https://example.com/gone", 10, 1);

    db.refresh_error(&record.id, 150, 0, 4, 100).unwrap();

    let reloaded = db
        .find_error_by_url(&site.id, "https://example.com/gone")
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.impressions, 150);
    assert_eq!(reloaded.backlink_count, 4);
    assert_eq!(reloaded.priority_score, 100);
    assert_eq!(reloaded.status, ErrorStatus::New);
}

#[test]
fn test_fixed_urls() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();
    let a = seed_error(&db, &site.id, "https://example.com/a", 10, 0);
    seed_error(&db, &site.id, "https://example.com/b", 10, 0);
    db.update_error_status(&a.id, ErrorStatus::Fixed).unwrap();

    let urls = db.fixed_urls(&site.id, 50).unwrap();
    assert_eq!(urls, vec!["https://example.com/a".to_string()]);
}

// ============================================================================
// Backlink and Recommendation Tests
// ============================================================================

#[test]
fn test_backlinks_are_deduplicated() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();
    let record = seed_error(&db, &site.id, "https://example.com/gone", 10, 0);

    assert!(db.insert_backlink(&record.id, "https://example.com/", Some("Old page")).unwrap());
    assert!(!db.insert_backlink(&record.id, "https://example.com/", Some("Old page")).unwrap());
    assert!(db.insert_backlink(&record.id, "https://example.com/blog", None).unwrap());

    let backlinks = db.list_backlinks(&record.id).unwrap();
    assert_eq!(backlinks.len(), 2);
    assert_eq!(backlinks[0].anchor_text.as_deref(), Some("Old page"));
    assert!(backlinks[1].anchor_text.is_none());
}

#[test]
fn test_replace_backlinks_drops_pages_that_stopped_linking() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();
    let record = seed_error(&db, &site.id, "https://example.com/gone", 10, 0);

    db.replace_backlinks(
        &record.id,
        &[
            ("https://example.com/", Some("Old page")),
            ("https://example.com/a", None),
        ],
    )
    .unwrap();
    let kept_id = db.list_backlinks(&record.id).unwrap()[0].id.clone();

    db.replace_backlinks(
        &record.id,
        &[
            ("https://example.com/", Some("Old page")),
            ("https://example.com/c", None),
        ],
    )
    .unwrap();

    let backlinks = db.list_backlinks(&record.id).unwrap();
    let sources: Vec<&str> = backlinks.iter().map(|b| b.source_url.as_str()).collect();
    assert_eq!(sources, vec!["https://example.com/", "https://example.com/c"]);
    assert_eq!(backlinks[0].id, kept_id);

    db.replace_backlinks(&record.id, &[]).unwrap();
    assert!(db.list_backlinks(&record.id).unwrap().is_empty());
}

#[test]
fn test_upsert_recommendation_keeps_id() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();
    let record = seed_error(&db, &site.id, "https://example.com/gone", 10, 0);

    let mut first = Recommendation::new(&record.id);
    first.redirect_target = Some("CREATE_NEW".to_string());
    let stored_first = db.upsert_recommendation(&first).unwrap();

    let mut second = Recommendation::new(&record.id);
    second.redirect_target = Some("https://example.com/new".to_string());
    let stored_second = db.upsert_recommendation(&second).unwrap();

    assert_eq!(stored_first.id, stored_second.id);
    let reloaded = db.get_recommendation(&record.id).unwrap().unwrap();
    assert_eq!(reloaded.redirect_target.as_deref(), Some("https://example.com/new"));
}

// ============================================================================
// Scan Log and Dashboard Tests
// ============================================================================

#[test]
fn test_scan_log_lifecycle() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();

    let completed = db.create_scan_log(&site.id, ScanType::Manual).unwrap();
    db.complete_scan_log(&completed.id, 3).unwrap();
    let failed = db.create_scan_log(&site.id, ScanType::Manual).unwrap();
    db.fail_scan_log(&failed.id, "connection refused").unwrap();

    let scans = db.recent_scans(&user.id, 5).unwrap();
    assert_eq!(scans.len(), 2);
    assert_eq!(scans[0].status, ScanStatus::Failed);
    assert_eq!(scans[0].error_message.as_deref(), Some("connection refused"));
    assert_eq!(scans[1].status, ScanStatus::Completed);
    assert_eq!(scans[1].errors_found, 3);
}

#[test]
fn test_dashboard_stats() {
    let (_temp_dir, db) = create_test_db();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();
    let site = db.create_site(&user.id, "https://example.com").unwrap();

    let a = seed_error(&db, &site.id, "https://example.com/a", 75, 5);
    let b = seed_error(&db, &site.id, "https://example.com/b", 90, 4);
    seed_error(&db, &site.id, "https://example.com/c", 60, 3);
    seed_error(&db, &site.id, "https://example.com/d", 20, 0);
    let e = seed_error(&db, &site.id, "https://example.com/e", 10, 0);
    db.update_error_status(&a.id, ErrorStatus::Fixed).unwrap();
    db.update_error_status(&b.id, ErrorStatus::Fixed).unwrap();
    db.update_error_status(&e.id, ErrorStatus::Fixed).unwrap();

    let stats = db.dashboard_stats(&user.id).unwrap();
    assert_eq!(stats.sites_count, 1);
    assert_eq!(stats.total_errors, 5);
    assert_eq!(stats.new_errors, 2);
    assert_eq!(stats.fixed_errors, 3);
    assert_eq!(stats.backlinks_affected, 12);
}

#[test]
fn test_dashboard_stats_empty() {
    let db = Database::in_memory().unwrap();
    let user = db.upsert_user_by_email(DEMO_EMAIL).unwrap();

    let stats = db.dashboard_stats(&user.id).unwrap();
    assert_eq!(stats.total_errors, 0);
    assert_eq!(stats.backlinks_affected, 0);
    assert!(stats.recent_scans.is_empty());
}
