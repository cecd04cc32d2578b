//! Integration tests for the admin facade over a bootstrapped daemon.

use ramp_domain::{
    ExchangeRatesPatch, OrderFilter, OrderStatus, OrderType, SwapConfigPatch, SwapRequest,
};
use ramp_store::{collection_file, Store};
use ramp_testkit::{deposit_submission, withdraw_submission, TEST_WALLET};
use rampd::{Config, Daemon, DaemonError, StatsPeriod};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use uuid::Uuid;

async fn boot() -> anyhow::Result<(Daemon, TempDir)> {
    let dir = tempfile::tempdir()?;
    let daemon = Daemon::bootstrap(Config::test(dir.path())).await?;
    Ok((daemon, dir))
}

#[tokio::test]
async fn test_bootstrap_creates_storage_files() -> anyhow::Result<()> {
    let (_daemon, dir) = boot().await?;

    for order_type in OrderType::ALL {
        assert!(dir.path().join(collection_file(order_type)).exists());
    }
    assert!(dir.path().join("swap_config.json").exists());
    assert!(dir.path().join("exchange_rates.json").exists());
    assert!(dir.path().join("app_mode_config.json").exists());
    assert!(dir.path().join("analytics_data.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_second_daemon_on_same_dir_fails() -> anyhow::Result<()> {
    let (_daemon, dir) = boot().await?;

    let err = Daemon::bootstrap(Config::test(dir.path())).await.err();
    assert!(matches!(err, Some(DaemonError::Store(e)) if e.is_retryable()));
    Ok(())
}

#[tokio::test]
async fn test_update_status_any_finds_withdraw() -> anyhow::Result<()> {
    let (daemon, _dir) = boot().await?;
    let store = daemon.store();

    let withdraw = store
        .orders()
        .append(OrderType::Withdraw, withdraw_submission(dec!(50), dec!(1225000))?)
        .await?;

    let updated = daemon
        .admin()
        .update_status_any(withdraw.id, OrderStatus::Cancelled, Some("user request".to_string()))
        .await?;

    assert_eq!(updated.id, withdraw.id);
    assert_eq!(updated.status, OrderStatus::Cancelled);
    assert_eq!(daemon.admin().find_order_any(withdraw.id).await?, updated);
    assert_eq!(store.orders().count(OrderType::Deposit).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_unknown_id_is_order_not_found() -> anyhow::Result<()> {
    let (daemon, _dir) = boot().await?;
    let id = Uuid::now_v7();

    let err = daemon.admin().find_order_any(id).await.unwrap_err();
    assert!(matches!(err, DaemonError::OrderNotFound(missing) if missing == id));
    assert!(err.is_not_found());

    let err = daemon
        .admin()
        .update_status_any(id, OrderStatus::Completed, None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_dashboard_totals() -> anyhow::Result<()> {
    let (daemon, _dir) = boot().await?;
    let orders = daemon.store();
    let orders = orders.orders();

    let first = orders
        .append(OrderType::Deposit, deposit_submission(dec!(100), dec!(2450000))?)
        .await?;
    orders
        .append(OrderType::Deposit, deposit_submission(dec!(40), dec!(980000))?)
        .await?;
    orders
        .append(OrderType::Withdraw, withdraw_submission(dec!(15), dec!(367500))?)
        .await?;
    orders
        .update_status(OrderType::Deposit, first.id, OrderStatus::Completed, None)
        .await?;

    let dashboard = daemon.admin().dashboard().await?;

    assert_eq!(dashboard.summary.total_deposits, 2);
    assert_eq!(dashboard.summary.pending_deposits, 1);
    assert_eq!(dashboard.summary.total_withdraws, 1);
    assert_eq!(dashboard.summary.pending_withdraws, 1);
    assert_eq!(dashboard.summary.total_usdt_deposited, dec!(140));
    assert_eq!(dashboard.summary.total_usdt_withdrawn, dec!(15));
    assert_eq!(dashboard.recent_orders.deposits.len(), 2);
    assert_eq!(dashboard.config.exchange_rates.usd_to_vnd, dec!(24500));

    let json = serde_json::to_value(&dashboard)?;
    assert_eq!(json["summary"]["totalUSDTDeposited"], "140");
    assert!(json["recentOrders"]["withdraws"].is_array());
    Ok(())
}

#[tokio::test]
async fn test_combined_listing_merges_both_types() -> anyhow::Result<()> {
    let (daemon, _dir) = boot().await?;
    let store = daemon.store();

    for _ in 0..3 {
        store
            .orders()
            .append(OrderType::Deposit, deposit_submission(dec!(1), dec!(24500))?)
            .await?;
        store
            .orders()
            .append(OrderType::Withdraw, withdraw_submission(dec!(1), dec!(24500))?)
            .await?;
    }

    let filter = OrderFilter {
        limit: 4,
        offset: 1,
        ..OrderFilter::default()
    };
    let page = daemon.admin().list_orders(None, &filter).await?;

    assert_eq!(page.total, 6);
    assert_eq!(page.orders.len(), 4);
    assert!(page.orders.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let deposits = daemon.admin().list_orders(Some(OrderType::Deposit), &filter).await?;
    assert_eq!(deposits.total, 3);
    assert!(deposits.orders.iter().all(|o| o.order_type() == OrderType::Deposit));

    let wallet_filter = OrderFilter {
        wallet_address: Some(TEST_WALLET.to_lowercase()),
        ..OrderFilter::default()
    };
    assert_eq!(daemon.admin().list_orders(None, &wallet_filter).await?.total, 6);
    Ok(())
}

#[tokio::test]
async fn test_period_stats() -> anyhow::Result<()> {
    let (daemon, _dir) = boot().await?;
    daemon
        .store()
        .orders()
        .append(OrderType::Deposit, deposit_submission(dec!(100), dec!(2450000))?)
        .await?;

    let stats = daemon.admin().period_stats(StatsPeriod::from_code("1d")).await?;
    assert_eq!(stats.period, "1d");
    assert_eq!(stats.deposits.count, 1);
    assert_eq!(stats.deposits.total_vnd, dec!(2450000));
    assert_eq!(stats.withdraws.count, 0);
    assert!(stats.end - stats.start == chrono::Duration::days(1));

    assert_eq!(StatsPeriod::from_code("1y"), StatsPeriod::Week);
    Ok(())
}

#[tokio::test]
async fn test_rates_fees_and_swaps_follow_config() -> anyhow::Result<()> {
    let (daemon, _dir) = boot().await?;
    let config = daemon.store();
    let config = config.config();

    config
        .update_exchange_rates(ExchangeRatesPatch::admin(dec!(25000), None))
        .await?;
    config
        .update_swap_config(SwapConfigPatch {
            platform_fee_percentage: Some(dec!(1)),
            enabled_tokens: Some(vec!["USDT".to_string(), "BNB".to_string()]),
            ..Default::default()
        })
        .await?;

    let rates = daemon.admin().public_rates().await?;
    assert_eq!(rates.usd_to_vnd, dec!(25000));
    assert_eq!(rates.platform_fee_percentage, dec!(1));
    assert_eq!(rates.source, "admin");

    assert_eq!(daemon.admin().supported_tokens().await?, vec!["USDT", "BNB"]);

    let quote = daemon.admin().quote_fee(dec!(200)).await?;
    assert_eq!(quote.platform_fee_amount, dec!(2));
    assert_eq!(quote.net_amount, dec!(198));
    assert!(daemon.admin().quote_fee(dec!(0)).await.unwrap_err().is_validation());

    let request = SwapRequest {
        from_token: "USDT".to_string(),
        to_token: "BNB".to_string(),
        amount: dec!(50),
        wallet_address: TEST_WALLET.to_string(),
    };
    let validation = daemon.admin().validate_swap(&request).await?;
    assert_eq!(validation.net_amount, dec!(49.5));

    let eth = SwapRequest {
        to_token: "ETH".to_string(),
        ..request
    };
    assert!(daemon.admin().validate_swap(&eth).await.unwrap_err().is_validation());
    Ok(())
}
