use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let orm = create_orm_conn(&pool);
        Self { pool, orm, config }
    }
}
