#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use equb_ledger::models::{EqubParams, Frequency};
use equb_ledger::{Clock, EqubApp, MemoryBackend};

/// Settable clock shared between the test and the app under test
#[derive(Clone)]
pub struct TestClock {
    now: Rc<Cell<NaiveDateTime>>,
}

impl TestClock {
    pub fn at(date: &str) -> Self {
        Self {
            now: Rc::new(Cell::new(dt(date))),
        }
    }

    pub fn set(&self, date: &str) {
        self.now.set(dt(date));
    }

    pub fn advance_days(&self, days: i64) {
        self.now.set(self.now.get() + chrono::Duration::days(days));
    }
}

impl Clock for TestClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad test date")
}

pub fn dt(s: &str) -> NaiveDateTime {
    d(s).and_hms_opt(12, 0, 0).expect("bad test time")
}

pub fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

/// Fresh in-memory app with the given clock and an owner profile
pub fn app_with_owner(clock: &TestClock, owner_name: &str) -> (EqubApp, Uuid) {
    let mut app = EqubApp::with_clock(Box::new(MemoryBackend::default()), Box::new(clock.clone()))
        .expect("open app");
    let owner_id = app
        .set_owner(owner_name, None, None)
        .expect("set owner profile");
    (app, owner_id)
}

pub fn params(frequency: Frequency, target: u32, goal: i64, contribution: i64, start: &str) -> EqubParams {
    EqubParams {
        name: "Idir Savings".to_string(),
        frequency,
        target_members: target,
        goal_amount: dec(goal),
        contribution_amount: dec(contribution),
        start_date: d(start),
    }
}

/// Two-member monthly equb, activated, with member ids returned as
/// (owner, second member)
pub fn two_member_equb(app: &mut EqubApp, owner_id: Uuid, start: &str) -> (Uuid, Uuid, Uuid) {
    let equb_id = app
        .create_equb(params(Frequency::Monthly, 2, 1000, 500, start))
        .expect("create equb");
    let second = app
        .add_member(equb_id, "Bekele", Some("0911-000000".to_string()))
        .expect("add second member");
    (equb_id, owner_id, second)
}
