use crate::{AnnotatedProfile, Profile, profile_total};

/// Anything rankable by price.
pub trait Priced {
    fn total_price(&self) -> f64;
}

impl Priced for Profile {
    fn total_price(&self) -> f64 {
        profile_total(self)
    }
}

impl Priced for AnnotatedProfile<'_> {
    fn total_price(&self) -> f64 {
        profile_total(self.profile)
    }
}

impl<T: Priced> Priced for (usize, T) {
    fn total_price(&self) -> f64 {
        self.1.total_price()
    }
}

/// Cheapest first. Equal totals keep their input order.
pub fn rank<T: Priced>(items: Vec<T>) -> Vec<T> {
    let mut keyed: Vec<(f64, T)> = items
        .into_iter()
        .map(|item| (item.total_price(), item))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    keyed.into_iter().map(|(_, item)| item).collect()
}
