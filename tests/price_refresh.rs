mod common;

use angi_pricing::PriceSource;
use chrono::{Duration, Utc};
use common::*;
use std::sync::Arc;

#[tokio::test]
async fn refresh_all_prices_hits_and_stamps_misses() {
    let pool = setup_pool().await;
    insert_ingredient(&pool, "i1", "cà chua", "kg").await;
    insert_ingredient(&pool, "i2", "rau má", "g").await;

    let source = ScriptedSource::new(&[("cà chua", "150.000đ/kg")]);
    let state = wire(pool, vec![source.clone() as Arc<dyn PriceSource>]);

    let report = state.refresher.refresh_all().await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.unchecked_but_stamped, 1);

    let ingredients = state
        .cache
        .ingredients_by_ids(&["i1".to_string(), "i2".to_string()])
        .await
        .unwrap();

    let tomato = ingredients.iter().find(|i| i.id == "i1").unwrap();
    assert_eq!(tomato.price_per_unit, Some(150.0));
    assert_eq!(tomato.price_currency.as_deref(), Some("VND"));
    assert!(tomato.price_updated_at.is_some());

    // the miss is stamped as checked but keeps no price
    let herb = ingredients.iter().find(|i| i.id == "i2").unwrap();
    assert_eq!(herb.price_per_unit, None);
    assert!(herb.price_updated_at.is_none());
    assert!(herb.last_checked_at.is_some());
}

#[tokio::test]
async fn refresh_all_continues_past_source_failures() {
    let pool = setup_pool().await;
    insert_ingredient(&pool, "i1", "cà chua", "kg").await;
    insert_ingredient(&pool, "i2", "rau má", "g").await;

    let failing = FailingSource::new();
    let state = wire(pool, vec![failing.clone() as Arc<dyn PriceSource>]);

    let report = state.refresher.refresh_all().await.unwrap();

    assert_eq!(report.updated, 0);
    assert_eq!(report.unchecked_but_stamped, 2);
    assert_eq!(failing.calls(), 2);
}

#[tokio::test]
async fn throttle_refreshes_each_ingredient_at_most_once_per_day() {
    let pool = setup_pool().await;
    insert_ingredient(&pool, "i1", "cà chua", "kg").await;
    set_last_checked(&pool, "i1", Utc::now() - Duration::days(2)).await;

    let source = ScriptedSource::new(&[("cà chua", "150.000đ/kg")]);
    let state = wire(pool, vec![source.clone() as Arc<dyn PriceSource>]);

    let ids = vec!["i1".to_string()];
    state.refresher.ensure_fresh_prices(&ids).await.unwrap();
    state.refresher.ensure_fresh_prices(&ids).await.unwrap();

    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn throttle_skips_ingredients_already_checked_today() {
    let pool = setup_pool().await;
    insert_ingredient(&pool, "i1", "cà chua", "kg").await;
    set_last_checked(&pool, "i1", Utc::now()).await;

    let source = ScriptedSource::new(&[("cà chua", "150.000đ/kg")]);
    let state = wire(pool, vec![source.clone() as Arc<dyn PriceSource>]);

    state
        .refresher
        .ensure_fresh_prices(&["i1".to_string()])
        .await
        .unwrap();

    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn throttle_failure_leaves_no_stamp_so_retries_stay_possible() {
    let pool = setup_pool().await;
    insert_ingredient(&pool, "i1", "cà chua", "kg").await;

    let failing = FailingSource::new();
    let state = wire(pool, vec![failing.clone() as Arc<dyn PriceSource>]);

    assert!(
        state
            .refresher
            .ensure_fresh_prices(&["i1".to_string()])
            .await
            .is_err()
    );

    let ingredients = state
        .cache
        .ingredients_by_ids(&["i1".to_string()])
        .await
        .unwrap();
    assert!(ingredients[0].last_checked_at.is_none());

    // not suppressed: the next call reaches the source again
    let _ = state.refresher.ensure_fresh_prices(&["i1".to_string()]).await;
    assert_eq!(failing.calls(), 2);
}

#[tokio::test]
async fn fallback_source_answers_when_the_first_misses() {
    let pool = setup_pool().await;
    insert_ingredient(&pool, "i1", "đường", "kg").await;

    let scraper = ScriptedSource::new(&[]);
    let estimator = ScriptedSource::new(&[("đường", "22.000đ/500g")]);
    let state = wire(
        pool,
        vec![
            scraper.clone() as Arc<dyn PriceSource>,
            estimator.clone() as Arc<dyn PriceSource>,
        ],
    );

    let report = state.refresher.refresh_all().await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(scraper.calls(), 1);
    assert_eq!(estimator.calls(), 1);

    let ingredients = state
        .cache
        .ingredients_by_ids(&["i1".to_string()])
        .await
        .unwrap();
    // 22.000đ for 500g → 44 per gram
    assert_eq!(ingredients[0].price_per_unit, Some(44.0));
}
