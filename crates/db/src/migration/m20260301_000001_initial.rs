//! Initial database migration.
//!
//! Creates all platform tables and indexes. Status columns are VARCHAR;
//! the core crate's closed enums own the vocabulary.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ACCOUNTS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(SESSIONS_SQL).await?;
        db.execute_unprepared(USER_PROFILES_SQL).await?;

        // ============================================================
        // PART 2: KYC
        // ============================================================
        db.execute_unprepared(KYC_APPLICATIONS_SQL).await?;
        db.execute_unprepared(KYC_DOCUMENTS_SQL).await?;

        // ============================================================
        // PART 3: FINANCING
        // ============================================================
        db.execute_unprepared(FINANCING_APPLICATIONS_SQL).await?;
        db.execute_unprepared(INSTALLMENTS_SQL).await?;

        // ============================================================
        // PART 4: PAYMENTS
        // ============================================================
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(SCHEDULED_PAYMENTS_SQL).await?;

        // ============================================================
        // PART 5: DOCUMENTS & SIGNATURES
        // ============================================================
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        db.execute_unprepared(SIGNATURE_REQUESTS_SQL).await?;
        db.execute_unprepared(SIGNATURES_SQL).await?;

        // ============================================================
        // PART 6: NOTIFICATIONS & REQUESTS
        // ============================================================
        db.execute_unprepared(NOTIFICATIONS_SQL).await?;
        db.execute_unprepared(CLIENT_REQUESTS_SQL).await?;

        // ============================================================
        // PART 7: PUBLIC CONTENT
        // ============================================================
        db.execute_unprepared(CONTENT_PAGES_SQL).await?;
        db.execute_unprepared(FAQ_ITEMS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    role VARCHAR(20) NOT NULL DEFAULT 'client',
    client_id VARCHAR(20) NOT NULL UNIQUE,
    account_number VARCHAR(20) NOT NULL UNIQUE,
    mfa_enabled BOOLEAN NOT NULL DEFAULT false,
    mfa_secret VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_email ON users(email) WHERE is_active = true;
";

const SESSIONS_SQL: &str = r"
CREATE TABLE sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    refresh_token_hash VARCHAR(64) NOT NULL,
    user_agent TEXT,
    ip_address VARCHAR(45),
    expires_at TIMESTAMPTZ NOT NULL,
    revoked_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_sessions_user ON sessions(user_id);
CREATE INDEX idx_sessions_token ON sessions(refresh_token_hash) WHERE revoked_at IS NULL;
";

const USER_PROFILES_SQL: &str = r"
CREATE TABLE user_profiles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    phone VARCHAR(30),
    address_line1 VARCHAR(255),
    address_line2 VARCHAR(255),
    city VARCHAR(100),
    country VARCHAR(100),
    postal_code VARCHAR(20),
    date_of_birth DATE,
    occupation VARCHAR(100),
    employer VARCHAR(100),
    monthly_income NUMERIC(12, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const KYC_APPLICATIONS_SQL: &str = r"
CREATE TABLE kyc_applications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    status VARCHAR(20) NOT NULL DEFAULT 'draft',
    rejection_reason TEXT,
    reviewed_by UUID REFERENCES users(id) ON DELETE SET NULL,
    reviewed_at TIMESTAMPTZ,
    submitted_at TIMESTAMPTZ,
    summary_document_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_kyc_applications_status ON kyc_applications(status);
";

const KYC_DOCUMENTS_SQL: &str = r"
CREATE TABLE kyc_documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    kyc_application_id UUID NOT NULL REFERENCES kyc_applications(id) ON DELETE CASCADE,
    document_type VARCHAR(30) NOT NULL,
    storage_key VARCHAR(512) NOT NULL,
    file_name VARCHAR(255) NOT NULL,
    file_size BIGINT NOT NULL DEFAULT 0,
    content_type VARCHAR(100) NOT NULL,
    is_verified BOOLEAN NOT NULL DEFAULT false,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_kyc_documents_application ON kyc_documents(kyc_application_id);
";

const FINANCING_APPLICATIONS_SQL: &str = r"
CREATE TABLE financing_applications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    reference VARCHAR(20) NOT NULL UNIQUE,
    status VARCHAR(20) NOT NULL DEFAULT 'draft',
    amount NUMERIC(12, 2) NOT NULL,
    period_months INTEGER NOT NULL,
    fee_percentage NUMERIC(5, 2) NOT NULL,
    fee_amount NUMERIC(12, 2) NOT NULL,
    monthly_installment NUMERIC(12, 2) NOT NULL,
    total_with_fee NUMERIC(12, 2) NOT NULL,
    purpose TEXT,
    ack_terms BOOLEAN NOT NULL DEFAULT false,
    ack_fee_non_refundable BOOLEAN NOT NULL DEFAULT false,
    ack_repayment_schedule BOOLEAN NOT NULL DEFAULT false,
    ack_risk_disclosure BOOLEAN NOT NULL DEFAULT false,
    rejection_reason TEXT,
    submitted_at TIMESTAMPTZ,
    fee_paid_at TIMESTAMPTZ,
    signed_at TIMESTAMPTZ,
    approved_by UUID REFERENCES users(id) ON DELETE SET NULL,
    approved_at TIMESTAMPTZ,
    activated_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    cancelled_by UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_financing_applications_user ON financing_applications(user_id);
CREATE INDEX idx_financing_applications_status ON financing_applications(status);
";

const INSTALLMENTS_SQL: &str = r"
CREATE TABLE installments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    financing_application_id UUID NOT NULL REFERENCES financing_applications(id) ON DELETE CASCADE,
    sequence INTEGER NOT NULL,
    amount NUMERIC(12, 2) NOT NULL,
    amount_paid NUMERIC(12, 2) NOT NULL DEFAULT 0,
    due_date DATE NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'upcoming',
    paid_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (financing_application_id, sequence)
);

CREATE INDEX idx_installments_application ON installments(financing_application_id);
CREATE INDEX idx_installments_due ON installments(due_date, status);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    financing_application_id UUID REFERENCES financing_applications(id) ON DELETE CASCADE,
    installment_id UUID REFERENCES installments(id) ON DELETE SET NULL,
    payment_type VARCHAR(20) NOT NULL,
    payment_method VARCHAR(20) NOT NULL,
    amount NUMERIC(12, 2) NOT NULL,
    currency VARCHAR(10) NOT NULL DEFAULT 'USD',
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    transaction_reference VARCHAR(100) NOT NULL UNIQUE,
    card_session_id VARCHAR(255),
    card_payment_intent_id VARCHAR(255),
    crypto_payment_id VARCHAR(255),
    crypto_order_id VARCHAR(255),
    crypto_address VARCHAR(255),
    crypto_amount NUMERIC(18, 8),
    crypto_currency VARCHAR(20),
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_payments_user ON payments(user_id);
CREATE INDEX idx_payments_card_session ON payments(card_session_id);
CREATE INDEX idx_payments_card_intent ON payments(card_payment_intent_id);
CREATE INDEX idx_payments_crypto_order ON payments(crypto_order_id);
";

const SCHEDULED_PAYMENTS_SQL: &str = r"
CREATE TABLE scheduled_payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    installment_id UUID NOT NULL REFERENCES installments(id) ON DELETE CASCADE,
    scheduled_date DATE NOT NULL,
    payment_method VARCHAR(20) NOT NULL,
    is_processed BOOLEAN NOT NULL DEFAULT false,
    processed_at TIMESTAMPTZ,
    reminder_sent_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_scheduled_payments_date ON scheduled_payments(scheduled_date)
    WHERE is_processed = false;
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    financing_application_id UUID REFERENCES financing_applications(id) ON DELETE CASCADE,
    payment_id UUID REFERENCES payments(id) ON DELETE SET NULL,
    document_type VARCHAR(20) NOT NULL,
    document_number VARCHAR(30) NOT NULL UNIQUE,
    title VARCHAR(255) NOT NULL,
    storage_key VARCHAR(512) NOT NULL,
    verification_code VARCHAR(64) NOT NULL,
    is_signed BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_documents_user ON documents(user_id);
CREATE INDEX idx_documents_verification ON documents(verification_code);
";

const SIGNATURE_REQUESTS_SQL: &str = r"
CREATE TABLE signature_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    document_id UUID NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    financing_application_id UUID NOT NULL REFERENCES financing_applications(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    expires_at TIMESTAMPTZ NOT NULL,
    signed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_signature_requests_user ON signature_requests(user_id) WHERE status = 'pending';
CREATE INDEX idx_signature_requests_application ON signature_requests(financing_application_id);
";

const SIGNATURES_SQL: &str = r"
CREATE TABLE signatures (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    signature_request_id UUID NOT NULL UNIQUE REFERENCES signature_requests(id) ON DELETE CASCADE,
    signature_text VARCHAR(255) NOT NULL,
    consent_text TEXT NOT NULL,
    ip_address VARCHAR(45) NOT NULL,
    user_agent TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const NOTIFICATIONS_SQL: &str = r"
CREATE TABLE notifications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    message TEXT NOT NULL,
    channel VARCHAR(10) NOT NULL DEFAULT 'in_app',
    category VARCHAR(20) NOT NULL DEFAULT 'system',
    is_read BOOLEAN NOT NULL DEFAULT false,
    read_at TIMESTAMPTZ,
    action_url VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_notifications_user ON notifications(user_id, is_read);
";

const CLIENT_REQUESTS_SQL: &str = r"
CREATE TABLE client_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    financing_application_id UUID REFERENCES financing_applications(id) ON DELETE CASCADE,
    request_type VARCHAR(20) NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    subject VARCHAR(255) NOT NULL,
    description TEXT,
    details JSONB NOT NULL DEFAULT '{}',
    admin_response TEXT,
    reviewed_by UUID REFERENCES users(id) ON DELETE SET NULL,
    reviewed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_client_requests_user ON client_requests(user_id);
CREATE INDEX idx_client_requests_status ON client_requests(status);
";

const CONTENT_PAGES_SQL: &str = r"
CREATE TABLE content_pages (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    slug VARCHAR(100) NOT NULL UNIQUE,
    title VARCHAR(255) NOT NULL,
    content TEXT NOT NULL,
    meta_description VARCHAR(160),
    is_published BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const FAQ_ITEMS_SQL: &str = r"
CREATE TABLE faq_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    question VARCHAR(500) NOT NULL,
    answer TEXT NOT NULL,
    category VARCHAR(20) NOT NULL DEFAULT 'general',
    sort_order INTEGER NOT NULL DEFAULT 0,
    is_published BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS faq_items;
DROP TABLE IF EXISTS content_pages;
DROP TABLE IF EXISTS client_requests;
DROP TABLE IF EXISTS notifications;
DROP TABLE IF EXISTS signatures;
DROP TABLE IF EXISTS signature_requests;
DROP TABLE IF EXISTS documents;
DROP TABLE IF EXISTS scheduled_payments;
DROP TABLE IF EXISTS payments;
DROP TABLE IF EXISTS installments;
DROP TABLE IF EXISTS financing_applications;
DROP TABLE IF EXISTS kyc_documents;
DROP TABLE IF EXISTS kyc_applications;
DROP TABLE IF EXISTS user_profiles;
DROP TABLE IF EXISTS sessions;
DROP TABLE IF EXISTS users;
";
