//! Initial database migration.
//!
//! Creates the enums, tables, indexes and the append-only trigger on
//! approval history.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COMPANIES AND USERS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: ROUTING POLICIES
        // ============================================================
        db.execute_unprepared(APPROVAL_FLOWS_SQL).await?;
        db.execute_unprepared(APPROVAL_RULES_SQL).await?;

        // ============================================================
        // PART 4: EXPENSES & HISTORY
        // ============================================================
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(APPROVAL_HISTORY_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('employee', 'manager', 'admin');

CREATE TYPE expense_status AS ENUM ('pending', 'approved', 'rejected', 'escalated');

CREATE TYPE approval_action AS ENUM ('approved', 'rejected', 'escalated');

CREATE TYPE approval_rule_type AS ENUM ('percentage', 'specific_approver', 'hybrid');
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    currency VARCHAR(3) NOT NULL CHECK (currency ~ '^[A-Z]{3}$'),
    country VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id),
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    role user_role NOT NULL DEFAULT 'employee',
    manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
    is_manager_approver BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_users_not_own_manager CHECK (manager_id IS NULL OR manager_id <> id)
);

CREATE INDEX idx_users_company ON users(company_id);
CREATE INDEX idx_users_manager ON users(manager_id) WHERE manager_id IS NOT NULL;
";

const APPROVAL_FLOWS_SQL: &str = r"
CREATE TABLE approval_flows (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id),
    name VARCHAR(255) NOT NULL,
    steps JSONB NOT NULL,
    min_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    max_amount NUMERIC(15, 2),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_flows_steps CHECK (
        jsonb_typeof(steps) = 'array' AND jsonb_array_length(steps) > 0
    ),
    CONSTRAINT chk_flows_band CHECK (
        min_amount >= 0 AND (max_amount IS NULL OR max_amount >= min_amount)
    )
);

CREATE INDEX idx_approval_flows_lookup ON approval_flows(company_id, min_amount DESC)
    WHERE is_active = true;
";

const APPROVAL_RULES_SQL: &str = r"
CREATE TABLE approval_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id),
    name VARCHAR(255) NOT NULL,
    rule_type approval_rule_type NOT NULL,
    approval_percentage INTEGER,
    specific_approver_id UUID REFERENCES users(id),
    min_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    max_amount NUMERIC(15, 2),
    is_active BOOLEAN NOT NULL DEFAULT true,
    approval_flow_id UUID REFERENCES approval_flows(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_rules_percentage CHECK (
        approval_percentage IS NULL OR approval_percentage BETWEEN 1 AND 100
    ),
    CONSTRAINT chk_rules_percentage_required CHECK (
        rule_type = 'specific_approver' OR approval_percentage IS NOT NULL
    ),
    CONSTRAINT chk_rules_approver_required CHECK (
        rule_type = 'percentage' OR specific_approver_id IS NOT NULL
    ),
    CONSTRAINT chk_rules_band CHECK (
        min_amount >= 0 AND (max_amount IS NULL OR max_amount >= min_amount)
    )
);

CREATE INDEX idx_approval_rules_lookup ON approval_rules(company_id, min_amount DESC)
    WHERE is_active = true;
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id),
    employee_id UUID NOT NULL REFERENCES users(id),
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL CHECK (currency ~ '^[A-Z]{3}$'),
    converted_amount NUMERIC(15, 2) NOT NULL CHECK (converted_amount >= 0),
    category VARCHAR(100) NOT NULL CHECK (length(trim(category)) > 0),
    description TEXT,
    expense_date DATE NOT NULL,
    status expense_status NOT NULL DEFAULT 'pending',
    approval_step INTEGER NOT NULL DEFAULT 0 CHECK (approval_step >= 0),
    current_approver_id UUID REFERENCES users(id),
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- pending <=> someone holds the expense
    CONSTRAINT chk_expenses_approver CHECK (
        (status = 'pending') = (current_approver_id IS NOT NULL)
    )
);

CREATE INDEX idx_expenses_employee ON expenses(employee_id, created_at DESC);
CREATE INDEX idx_expenses_company ON expenses(company_id, created_at DESC);
CREATE INDEX idx_expenses_awaiting ON expenses(current_approver_id) WHERE status = 'pending';
";

const APPROVAL_HISTORY_SQL: &str = r"
CREATE TABLE approval_history (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_id UUID NOT NULL REFERENCES expenses(id),
    approver_id UUID NOT NULL REFERENCES users(id),
    action approval_action NOT NULL,
    comments TEXT,
    step INTEGER NOT NULL CHECK (step >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_approval_history_expense ON approval_history(expense_id, created_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION prevent_history_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'approval_history is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_approval_history_immutable
    BEFORE UPDATE OR DELETE ON approval_history
    FOR EACH ROW EXECUTE FUNCTION prevent_history_mutation();

CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_companies_updated_at BEFORE UPDATE ON companies
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_users_updated_at BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_approval_flows_updated_at BEFORE UPDATE ON approval_flows
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_approval_rules_updated_at BEFORE UPDATE ON approval_rules
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_expenses_updated_at BEFORE UPDATE ON expenses
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS approval_history CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS approval_rules CASCADE;
DROP TABLE IF EXISTS approval_flows CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP FUNCTION IF EXISTS prevent_history_mutation() CASCADE;
DROP FUNCTION IF EXISTS touch_updated_at() CASCADE;

DROP TYPE IF EXISTS approval_rule_type;
DROP TYPE IF EXISTS approval_action;
DROP TYPE IF EXISTS expense_status;
DROP TYPE IF EXISTS user_role;
";
