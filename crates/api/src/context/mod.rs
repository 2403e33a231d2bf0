//! Application context - dependency injection container

use std::sync::Arc;

use mawid_core::appointments::ports::AppointmentRepository;
use mawid_core::groups::ports::GroupRepository;
use mawid_core::users::ports::UserRepository;
use mawid_core::{
    AppointmentService, Clock, GroupService, RatingService, StatusSweepService, SystemClock,
    UserService,
};
use mawid_domain::{Config, Result};
use mawid_infra::{
    DbManager, SqliteAppointmentRepository, SqliteGroupRepository, SqliteUserRepository,
};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub appointments: Arc<AppointmentService>,
    pub ratings: Arc<RatingService>,
    pub groups: Arc<GroupService>,
    pub users: Arc<UserService>,
    pub sweep: Arc<StatusSweepService>,
}

impl AppContext {
    /// Build the full dependency graph: pool, migrations, repositories,
    /// services.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let appointment_repo: Arc<dyn AppointmentRepository> =
            Arc::new(SqliteAppointmentRepository::new(Arc::clone(&db)));
        let group_repo: Arc<dyn GroupRepository> =
            Arc::new(SqliteGroupRepository::new(Arc::clone(&db)));
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(Arc::clone(&db)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let appointments = Arc::new(AppointmentService::new(
            Arc::clone(&appointment_repo),
            Arc::clone(&group_repo),
            Arc::clone(&user_repo),
            Arc::clone(&clock),
        ));
        let ratings =
            Arc::new(RatingService::new(Arc::clone(&appointment_repo), Arc::clone(&clock)));
        let groups = Arc::new(GroupService::new(
            Arc::clone(&group_repo),
            Arc::clone(&user_repo),
            Arc::clone(&clock),
        ));
        let users = Arc::new(UserService::new(
            Arc::clone(&user_repo),
            Arc::clone(&group_repo),
            Arc::clone(&clock),
        ));
        let sweep =
            Arc::new(StatusSweepService::new(Arc::clone(&appointment_repo), Arc::clone(&clock)));

        Ok(Self { config, db, appointments, ratings, groups, users, sweep })
    }
}
