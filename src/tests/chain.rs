use crate::{
    prelude::{
        BuiltinFilters, Error, FilterChain, FilterKind, SensorChannel, StateSnapshot, Vector3,
    },
    tests::{init_logger, test_home, ScriptedFilter, TestProvider},
};

use rstest::*;

#[test]
fn units_run_in_configuration_order() {
    init_logger();

    // Stationary writes, Complementary copies: order is observable
    let provider = TestProvider::new(|kind, journal| match kind {
        FilterKind::Stationary => Some(
            ScriptedFilter::new(kind, journal).with_action(|snapshot| {
                snapshot.velocity = Some(Vector3::new(1.0, 2.0, 3.0));
                Ok(())
            }),
        ),
        FilterKind::Complementary => Some(
            ScriptedFilter::new(kind, journal).with_action(|snapshot| {
                snapshot.position = snapshot.velocity;
                Ok(())
            }),
        ),
        _ => None,
    });

    let mut chain =
        FilterChain::build(&[FilterKind::Stationary, FilterKind::Complementary], &provider)
            .unwrap();

    let mut snapshot = StateSnapshot::default();
    assert!(chain.update(&mut snapshot).is_empty());
    assert_eq!(snapshot.position, Some(Vector3::new(1.0, 2.0, 3.0)));

    // reversed chain: copy happens before the write
    let mut chain =
        FilterChain::build(&[FilterKind::Complementary, FilterKind::Stationary], &provider)
            .unwrap();

    let mut snapshot = StateSnapshot::default();
    assert!(chain.update(&mut snapshot).is_empty());
    assert!(snapshot.position.is_none());
    assert_eq!(snapshot.velocity, Some(Vector3::new(1.0, 2.0, 3.0)));
}

#[test]
fn failing_unit_does_not_stop_the_chain() {
    init_logger();

    let provider = TestProvider::new(|kind, journal| match kind {
        FilterKind::Magnetometer => Some(ScriptedFilter::new(kind, journal).failing_update()),
        FilterKind::Barometer => Some(ScriptedFilter::new(kind, journal).with_action(
            |snapshot| match snapshot.barometer {
                Some(_) => Ok(()),
                None => Err(Error::MissingSample(SensorChannel::Barometer)),
            },
        )),
        _ => Some(ScriptedFilter::new(kind, journal)),
    });

    let kinds = [
        FilterKind::Magnetometer,
        FilterKind::Barometer,
        FilterKind::Stationary,
    ];
    let mut chain = FilterChain::build(&kinds, &provider).unwrap();

    let failures = chain.update(&mut StateSnapshot::default());
    assert_eq!(
        failures,
        vec![
            (FilterKind::Magnetometer, Error::Diverged),
            (
                FilterKind::Barometer,
                Error::MissingSample(SensorChannel::Barometer)
            ),
        ]
    );

    let updates = provider
        .journal()
        .into_iter()
        .filter(|(_, event)| *event == "update")
        .map(|(kind, _)| kind)
        .collect::<Vec<_>>();
    assert_eq!(updates, kinds.to_vec());
}

#[test]
fn initialization_failure_is_not_fatal() {
    init_logger();

    let provider = TestProvider::new(|kind, journal| match kind {
        FilterKind::Barometer => Some(ScriptedFilter::new(kind, journal).failing_init()),
        _ => Some(ScriptedFilter::new(kind, journal)),
    });

    let mut chain =
        FilterChain::build(&[FilterKind::Barometer, FilterKind::Stationary], &provider).unwrap();

    assert_eq!(chain.init_failures(), &[FilterKind::Barometer]);
    assert_eq!(chain.len(), 2);

    chain.update(&mut StateSnapshot::default());
    assert_eq!(
        provider.journal(),
        vec![
            (FilterKind::Barometer, "init"),
            (FilterKind::Stationary, "init"),
            (FilterKind::Barometer, "update"),
            (FilterKind::Stationary, "update"),
        ]
    );
}

#[rstest]
#[case(FilterKind::Ekf13)]
#[case(FilterKind::Ekf16)]
fn ekf_requires_external_provider(#[case] kind: FilterKind) {
    let provider = BuiltinFilters::default();
    let err = FilterChain::build(&[FilterKind::Magnetometer, kind], &provider).unwrap_err();
    assert_eq!(err, Error::FilterUnavailable(kind));

    // plugged in through a custom provider
    let provider = TestProvider::scripted();
    let chain = FilterChain::build(&[FilterKind::Magnetometer, kind], &provider).unwrap();
    assert_eq!(
        chain.kinds().collect::<Vec<_>>(),
        vec![FilterKind::Magnetometer, kind]
    );
}

#[test]
fn invalid_chains() {
    let provider = BuiltinFilters::default();
    assert_eq!(
        FilterChain::build(&[], &provider).unwrap_err(),
        Error::EmptyFilterChain
    );
    assert_eq!(
        FilterChain::build(&[FilterKind::Stationary, FilterKind::Stationary], &provider)
            .unwrap_err(),
        Error::DuplicateFilter(FilterKind::Stationary)
    );
}

#[test]
fn home_change_reaches_every_unit() {
    let provider = TestProvider::scripted();
    let mut chain =
        FilterChain::build(&[FilterKind::Magnetometer, FilterKind::Barometer], &provider)
            .unwrap();

    chain.on_home_changed(&test_home());

    let homes = provider
        .journal()
        .into_iter()
        .filter(|(_, event)| *event == "home")
        .count();
    assert_eq!(homes, 2);
}

#[test]
fn builtin_chain() {
    init_logger();

    let mut chain = FilterChain::build(
        &[
            FilterKind::Magnetometer,
            FilterKind::Barometer,
            FilterKind::ComplementaryMag,
        ],
        &BuiltinFilters::default(),
    )
    .unwrap();

    assert!(chain.init_failures().is_empty());
    chain.on_home_changed(&test_home());

    let mut snapshot = StateSnapshot {
        gyroscope: Some(Vector3::zeros()),
        accelerometer: Some(Vector3::new(0.0, 0.0, -9.81)),
        // |B| 4 times the home field: disturbed
        magnetometer: Some(Vector3::new(0.88, 0.0, 1.68)),
        barometer: Some(250.0),
        ..Default::default()
    };

    assert!(chain.update(&mut snapshot).is_empty());
    assert!(snapshot.magnetometer.is_none());
    // offset still being learned
    assert!(snapshot.barometer.is_none());
    assert!(snapshot.attitude.is_some());
}
