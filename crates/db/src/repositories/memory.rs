use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use rental_core::domain::booking::{Booking, BookingId};
use rental_core::domain::user::UserId;
use rental_core::domain::vehicle::{Vehicle, VehicleId};

use super::{
    BookingRepository, RepositoryError, SessionRecord, SessionRepository, VehicleRepository,
};

#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: RwLock<HashMap<String, Vehicle>>,
}

impl InMemoryVehicleRepository {
    pub fn with_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let vehicles =
            vehicles.into_iter().map(|vehicle| (vehicle.id().0.clone(), vehicle)).collect();
        Self { vehicles: RwLock::new(vehicles) }
    }
}

#[async_trait::async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles.get(&id.0).cloned())
    }

    async fn list(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        let vehicles = self.vehicles.read().await;
        let mut listed: Vec<Vehicle> = vehicles.values().cloned().collect();
        listed.sort_by(|left, right| {
            left.name().cmp(right.name()).then_with(|| left.id().cmp(right.id()))
        });
        Ok(listed)
    }

    async fn save(&self, vehicle: Vehicle) -> Result<(), RepositoryError> {
        let mut vehicles = self.vehicles.write().await;
        vehicles.insert(vehicle.id().0.clone(), vehicle);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<String, Booking>>,
}

#[async_trait::async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id.0).cloned())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Booking>, RepositoryError> {
        let bookings = self.bookings.read().await;
        let mut listed: Vec<Booking> =
            bookings.values().filter(|booking| &booking.user_id == user_id).cloned().collect();
        listed.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then_with(|| left.id.0.cmp(&right.id.0))
        });
        Ok(listed)
    }

    async fn save(&self, booking: Booking) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.write().await;
        bookings.insert(booking.id.0.clone(), booking);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

#[async_trait::async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: SessionRecord) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionRecord>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(token_hash).cloned())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_active_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use rental_core::domain::booking::{Booking, BookingId, BookingStatus};
    use rental_core::domain::user::UserId;
    use rental_core::domain::vehicle::{Vehicle, VehicleId, VehicleRecord};

    use crate::repositories::{
        hash_token, issue_session, BookingRepository, InMemoryBookingRepository,
        InMemorySessionRepository, InMemoryVehicleRepository, SessionRepository,
        VehicleRepository,
    };

    fn vehicle(id: &str, name: &str) -> Vehicle {
        Vehicle::try_from(VehicleRecord {
            id: id.to_string(),
            name: name.to_string(),
            model: "Base".to_string(),
            year: 2021,
            price_per_day: Decimal::new(35, 0),
            available: true,
            description: String::new(),
            features: Vec::new(),
            image_url: String::new(),
        })
        .expect("valid vehicle")
    }

    #[tokio::test]
    async fn in_memory_vehicle_repo_lists_in_catalog_order() {
        let repo = InMemoryVehicleRepository::with_vehicles([
            vehicle("v-2", "Seat"),
            vehicle("v-1", "Fiat"),
        ]);
        repo.save(vehicle("v-0", "Seat")).await.expect("save");

        let ids: Vec<String> =
            repo.list().await.expect("list").into_iter().map(|v| v.id().0.clone()).collect();

        assert_eq!(ids, vec!["v-1", "v-0", "v-2"]);
        assert!(repo.find_by_id(&VehicleId("v-9".to_string())).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn in_memory_booking_repo_scopes_by_user() {
        let repo = InMemoryBookingRepository::default();
        let now = Utc::now();
        let date = |day| chrono::NaiveDate::from_ymd_opt(2030, 2, day).expect("valid date");
        for (id, user, offset) in [("B-1", "ana", 0), ("B-2", "ana", 5), ("B-3", "bo", 1)] {
            repo.save(Booking {
                id: BookingId(id.to_string()),
                user_id: UserId(user.to_string()),
                vehicle_id: VehicleId("v-1".to_string()),
                start_date: date(1),
                end_date: date(2),
                rental_days: 1,
                total_price: Decimal::new(35, 0),
                status: BookingStatus::Pending,
                created_at: now + Duration::seconds(offset),
            })
            .await
            .expect("save");
        }

        let ids: Vec<String> = repo
            .list_for_user(&UserId("ana".to_string()))
            .await
            .expect("list")
            .into_iter()
            .map(|b| b.id.0)
            .collect();

        assert_eq!(ids, vec!["B-2", "B-1"]);
    }

    #[tokio::test]
    async fn in_memory_session_repo_expires_sessions() {
        let repo = InMemorySessionRepository::default();
        let now = Utc::now();
        let issued =
            issue_session(&repo, UserId("ana".to_string()), 2, now).await.expect("issue");

        assert!(repo
            .find_by_token_hash(&hash_token(issued.token.expose()))
            .await
            .expect("find")
            .is_some());

        let removed = repo.delete_expired(now + Duration::hours(3)).await.expect("purge");
        assert_eq!(removed, 1);
        assert!(repo.find_by_token_hash(&issued.record.token_hash).await.expect("find").is_none());
    }
}
