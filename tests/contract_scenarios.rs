use aqd::prelude::*;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn musharakah_60_40() -> MusharakahTerms {
    MusharakahTerms::new(dec!(600_000), dec!(400_000))
        .profit_shares(dec!(55), dec!(45))
        .loss_shares(dec!(60), dec!(40))
        .duration(24)
}

#[test]
fn test_murabaha_standard_scenario() {
    let mut terms = MurabahaTerms::new(dec!(1_000_000), dec!(150_000))
        .duration(12)
        .installments(12)
        .starts_on(date(2025, 1, 1));
    terms.selling_price = dec!(1_150_000);
    terms.profit_rate = dec!(15);
    let terms: ContractTerms = terms.into();

    let factory = ContractStrategyFactory::global();
    let strategy = factory.get_strategy("murabaha").expect("murabaha is registered");
    assert!(strategy.validate(&terms).unwrap().valid);

    let schedule = strategy
        .as_payment_based()
        .expect("murabaha is payment based")
        .calculate_payment_schedule(&terms)
        .expect("schedule");

    assert_eq!(schedule.len(), 12);
    assert_eq!(schedule.iter().map(|e| e.principal).sum::<Decimal>(), dec!(1_000_000));
    assert_eq!(schedule.iter().map(|e| e.profit).sum::<Decimal>(), dec!(150_000));
    assert_eq!(schedule.last().unwrap().due_date, date(2025, 12, 1));
}

#[test]
fn test_musharakah_profit_ratio_may_differ() {
    let result = ContractStrategyFactory::global().validate_terms(&musharakah_60_40().into());
    assert!(result.valid, "{}", result);
}

#[test]
fn test_musharakah_loss_ratio_violation_names_party() {
    let terms: ContractTerms = musharakah_60_40().loss_shares(dec!(50), dec!(50)).into();
    let result = ContractStrategyFactory::global().validate_terms(&terms);

    assert!(!result.valid);
    let party1 = result
        .errors
        .iter()
        .find(|e| e.contains("Party 1"))
        .expect("a Party 1 specific error");
    assert!(party1.contains("60.00%"));
    assert!(result.errors.iter().any(|e| e.contains("Party 2") && e.contains("40.00%")));
}

#[test]
fn test_salam_delivery_value_below_advance() {
    let terms: ContractTerms = SalamTerms::new(dec!(500_000), dec!(480_000), date(2025, 2, 1), date(2025, 8, 1))
        .duration(6)
        .commodity("dates", 20, "tonnes")
        .quality("Medjool, grade A")
        .into();

    let result = ContractStrategyFactory::global().validate_terms(&terms);
    assert!(!result.valid);
    assert_eq!(result.errors, vec!["Delivery value must be greater than advance payment".to_string()]);
}

#[test]
fn test_mudarabah_share_sum_error_mentions_100_percent() {
    for (investor, mudarib) in [(dec!(70), dec!(20)), (dec!(70), dec!(40)), (dec!(0), dec!(0))] {
        let terms: ContractTerms = MudarabahTerms::new(dec!(250_000), investor, mudarib).duration(12).into();
        let result = ContractStrategyFactory::global().validate_terms(&terms);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("100%")), "{:?}", result.errors);
    }
}

#[test]
fn test_musharakah_loss_ratio_property() {
    // Whenever loss shares equal the capital ratios, the ratio checks pass.
    let factory = ContractStrategyFactory::global();
    for (c1, c2) in [(1u32, 1u32), (3, 1), (7, 3), (1, 4), (99, 1)] {
        let p1 = Decimal::from(c1) * dec!(1000);
        let p2 = Decimal::from(c2) * dec!(1000);
        let share1 = (p1 / (p1 + p2) * dec!(100)).round_dp(2);
        let terms: ContractTerms = MusharakahTerms::new(p1, p2)
            .loss_shares(share1, dec!(100) - share1)
            .profit_shares(dec!(50), dec!(50))
            .duration(12)
            .into();
        let result = factory.validate_terms(&terms);
        assert!(result.valid, "{} / {}: {}", c1, c2, result);
    }
}

#[test]
fn test_distribution_completeness() {
    let factory = ContractStrategyFactory::global();
    let contracts: Vec<ContractTerms> = vec![
        musharakah_60_40().into(),
        MudarabahTerms::new(dec!(90_000), dec!(66.67), dec!(33.33)).duration(12).into(),
    ];

    for terms in &contracts {
        for profit in [dec!(0), dec!(0.01), dec!(1), dec!(100), dec!(12_345.67), dec!(999_999.99)] {
            let dist = factory.profit_distribution(terms, profit).unwrap();
            let total: Decimal = dist.distribution.iter().map(|d| d.amount).sum();
            assert_eq!(total, profit);
            assert_eq!(dist.total_profit, profit);
        }
    }

    let dist = factory.profit_distribution(&contracts[0], dec!(1000)).unwrap();
    assert_eq!(dist.distribution[0].percentage, dec!(55));
    assert_eq!(dist.distribution[1].percentage, dec!(45));
}

#[test]
fn test_calculations_are_idempotent() {
    let factory = ContractStrategyFactory::global();
    let contracts: Vec<ContractTerms> = vec![
        MurabahaTerms::new(dec!(75_000), dec!(6_250.50))
            .duration(18)
            .installments(18)
            .starts_on(date(2024, 1, 31))
            .into(),
        IjarahTerms::new(dec!(200_000), dec!(4_100))
            .duration(60)
            .purchase_option(dec!(20_000))
            .starts_on(date(2024, 5, 1))
            .into(),
        musharakah_60_40().into(),
        MudarabahTerms::new(dec!(100_000), dec!(70), dec!(30)).duration(6).expected_annual_return(9).into(),
        SalamTerms::new(dec!(40_000), dec!(46_000), date(2025, 1, 1), date(2025, 4, 1)).duration(3).into(),
    ];

    for terms in &contracts {
        assert_eq!(factory.calculate_metrics(terms), factory.calculate_metrics(terms));
        assert_eq!(factory.validate_terms(terms), factory.validate_terms(terms));
        if terms.contract_type().is_payment_based() {
            let first = factory.payment_schedule(terms).unwrap();
            assert_eq!(first, factory.payment_schedule(terms).unwrap());
        }
    }
}

#[test]
fn test_metrics_for_every_variant() {
    let factory = ContractStrategyFactory::global();

    let metrics = factory
        .calculate_metrics(&MurabahaTerms::new(dec!(100_000), dec!(10_000)).duration(24).into())
        .unwrap();
    assert_eq!(metrics.contract_type, ContractType::Murabaha);
    assert_eq!(metrics.effective_rate, dec!(5));

    let metrics = factory.calculate_metrics(&musharakah_60_40().into()).unwrap();
    assert_eq!(metrics.total_amount, dec!(1_000_000));
    assert_eq!(metrics.duration, 24);

    let metrics = factory
        .calculate_metrics(&IjarahTerms::new(dec!(60_000), dec!(1_000)).duration(36).into())
        .unwrap();
    assert_eq!(metrics.total_return, dec!(36_000));
    assert_eq!(metrics.effective_rate, dec!(20));
}

#[test]
fn test_early_settlement_through_factory() {
    let factory = ContractStrategyFactory::global();
    let terms: ContractTerms = MurabahaTerms::new(dec!(120_000), dec!(12_000))
        .duration(12)
        .installments(12)
        .early_settlement_discount(25)
        .into();

    let settlement = factory.early_settlement(&terms, 4).unwrap();
    assert_eq!(settlement.remaining_principal, dec!(80_000));
    assert_eq!(settlement.remaining_profit, dec!(8_000));
    assert_eq!(settlement.discount, dec!(2_000));
    assert_eq!(settlement.settlement_amount, dec!(86_000));

    let lease: ContractTerms = IjarahTerms::new(dec!(60_000), dec!(1_000)).duration(36).into();
    assert!(matches!(
        factory.early_settlement(&lease, 1),
        Err(ContractError::UnsupportedCapability { .. })
    ));
}
