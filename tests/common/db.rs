//! Postgres fixtures for tests that need real row locks and stock updates.
//!
//! Tests using these run only when `TEST_DATABASE_URL` points at a scratch
//! database. The schema is created on first use; every row a test inserts
//! carries fresh ids, so tests can share the database and run in parallel.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use uuid::Uuid;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

const SCHEMA_STATEMENTS: &[&str] = &[
    "DO $$ BEGIN
        CREATE TYPE car_category AS ENUM ('economy', 'compact', 'midsize', 'suv', 'luxury', 'van');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE transmission_type AS ENUM ('automatic', 'manual');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE fuel_type AS ENUM ('petrol', 'diesel', 'hybrid', 'electric');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE location_category AS ENUM ('base', 'airport', 'hotel', 'custom');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE extra_price_type AS ENUM ('per_day', 'one_time');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "DO $$ BEGIN
        CREATE TYPE booking_status AS ENUM ('draft', 'confirmed', 'cancelled', 'completed');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$",
    "CREATE TABLE IF NOT EXISTS cars (
        id UUID PRIMARY KEY,
        make TEXT NOT NULL,
        model TEXT NOT NULL,
        year INT NOT NULL,
        price_per_day NUMERIC(10, 2) NOT NULL,
        category car_category NOT NULL,
        seats INT NOT NULL,
        doors INT NOT NULL,
        transmission transmission_type NOT NULL,
        fuel_type fuel_type NOT NULL,
        image_urls TEXT[] NOT NULL DEFAULT '{}',
        available BOOLEAN NOT NULL DEFAULT true
    )",
    "CREATE TABLE IF NOT EXISTS seasonal_pricing (
        id UUID PRIMARY KEY,
        car_id UUID NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        valid_from DATE NOT NULL,
        valid_to DATE NOT NULL,
        price_per_day NUMERIC(10, 2) NOT NULL,
        priority INT NOT NULL DEFAULT 0,
        active BOOLEAN NOT NULL DEFAULT true,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS locations (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        category location_category NOT NULL,
        delivery_fee INT NOT NULL DEFAULT 0,
        active BOOLEAN NOT NULL DEFAULT true
    )",
    "CREATE TABLE IF NOT EXISTS extras (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        price NUMERIC(10, 2) NOT NULL,
        price_type extra_price_type NOT NULL,
        category TEXT NOT NULL,
        stock_quantity INT,
        max_per_booking INT NOT NULL DEFAULT 1,
        active BOOLEAN NOT NULL DEFAULT true
    )",
    "CREATE TABLE IF NOT EXISTS bookings (
        id UUID PRIMARY KEY,
        car_id UUID NOT NULL REFERENCES cars(id),
        renter_id UUID NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        pickup_time TIME NOT NULL,
        return_time TIME NOT NULL,
        pickup_location_id UUID REFERENCES locations(id),
        return_location_id UUID REFERENCES locations(id),
        status booking_status NOT NULL,
        expires_at TIMESTAMPTZ,
        car_rental_subtotal NUMERIC(10, 2) NOT NULL,
        pickup_delivery_fee NUMERIC(10, 2) NOT NULL,
        return_delivery_fee NUMERIC(10, 2) NOT NULL,
        extras_total NUMERIC(10, 2) NOT NULL,
        discount_amount NUMERIC(10, 2) NOT NULL,
        grand_total NUMERIC(10, 2) NOT NULL,
        requires_delivery_quote BOOLEAN NOT NULL DEFAULT false,
        payment_intent_id TEXT,
        discount_code_id UUID,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS booking_extras (
        booking_id UUID NOT NULL REFERENCES bookings(id) ON DELETE CASCADE,
        extra_id UUID NOT NULL REFERENCES extras(id),
        quantity INT NOT NULL,
        unit_price NUMERIC(10, 2) NOT NULL,
        total_price NUMERIC(10, 2) NOT NULL,
        PRIMARY KEY (booking_id, extra_id)
    )",
];

/// Pool for the scratch database, or `None` when none is configured
pub async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");

    SCHEMA
        .get_or_try_init(|| create_schema(&pool))
        .await
        .expect("create test schema");

    Some(pool)
}

async fn create_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub async fn insert_car(pool: &PgPool, price_per_day: Decimal) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO cars (
            id, make, model, year, price_per_day, category,
            seats, doors, transmission, fuel_type
        )
        VALUES ($1, 'Toyota', 'Corolla', 2022, $2, 'economy', 5, 4, 'automatic', 'petrol')
        "#,
    )
    .bind(id)
    .bind(price_per_day)
    .execute(pool)
    .await
    .expect("insert car");
    id
}

pub async fn insert_extra(pool: &PgPool, price: Decimal, stock: i32, max_per_booking: i32) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO extras (id, name, price, price_type, category, stock_quantity, max_per_booking)
        VALUES ($1, $2, $3, 'per_day', 'equipment', $4, $5)
        "#,
    )
    .bind(id)
    .bind(format!("GPS {}", id.simple()))
    .bind(price)
    .bind(stock)
    .bind(max_per_booking)
    .execute(pool)
    .await
    .expect("insert extra");
    id
}

pub async fn extra_stock(pool: &PgPool, extra_id: Uuid) -> Option<i32> {
    sqlx::query_scalar::<_, Option<i32>>("SELECT stock_quantity FROM extras WHERE id = $1")
        .bind(extra_id)
        .fetch_one(pool)
        .await
        .expect("read extra stock")
}
