//! Initial database migration.
//!
//! Creates the ledger core schema: enums, periods, journals, journal lines,
//! the sealed-journal immutability triggers, and row-level security
//! policies keyed on `app.current_org_id`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(PERIODS_SQL).await?;
        db.execute_unprepared(JOURNALS_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;
        db.execute_unprepared(IMMUTABILITY_SQL).await?;
        db.execute_unprepared(RLS_SQL).await?;

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
-- Period lifecycle
CREATE TYPE period_status AS ENUM ('open', 'closing', 'closed');

-- Journal lifecycle
CREATE TYPE journal_status AS ENUM ('draft', 'posted', 'reversed');
";

const PERIODS_SQL: &str = r"
CREATE TABLE periods (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL CHECK (length(trim(name)) > 0),
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status period_status NOT NULL DEFAULT 'open',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT periods_dates_ordered CHECK (start_date < end_date)
);

CREATE INDEX idx_periods_org_dates ON periods (organization_id, start_date, end_date);
";

const JOURNALS_SQL: &str = r"
CREATE TABLE journals (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    period_id UUID NOT NULL REFERENCES periods (id) ON DELETE RESTRICT,
    journal_number VARCHAR(100) NOT NULL,
    description TEXT NOT NULL CHECK (length(trim(description)) > 0),
    reference VARCHAR(255),
    posting_date DATE NOT NULL,
    status journal_status NOT NULL DEFAULT 'draft',
    currency CHAR(3) NOT NULL,
    hash_prev CHAR(64),
    hash_self CHAR(64),
    reversal_journal_id UUID,
    original_journal_id UUID,
    ext_uid VARCHAR(255),
    created_by UUID NOT NULL,
    posted_by UUID,
    posted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT journals_number_unique UNIQUE (organization_id, journal_number),
    CONSTRAINT journals_ext_uid_unique UNIQUE (organization_id, ext_uid),
    CONSTRAINT journals_sealed_have_hash CHECK (
        (status = 'draft' AND hash_self IS NULL)
        OR (status <> 'draft' AND hash_self IS NOT NULL AND posted_at IS NOT NULL)
    )
);

-- Chain walk: (posted_at, journal_number) ascending per organization.
CREATE INDEX idx_journals_chain
    ON journals (organization_id, posted_at, journal_number)
    WHERE status IN ('posted', 'reversed');
CREATE INDEX idx_journals_period ON journals (period_id);
CREATE INDEX idx_journals_org_posting_date ON journals (organization_id, posting_date);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    journal_id UUID NOT NULL REFERENCES journals (id) ON DELETE CASCADE,
    organization_id UUID NOT NULL,
    account_id UUID NOT NULL,
    line_number INTEGER NOT NULL CHECK (line_number >= 1),
    description TEXT NOT NULL,
    debit_amount NUMERIC(22, 4) NOT NULL DEFAULT 0,
    credit_amount NUMERIC(22, 4) NOT NULL DEFAULT 0,
    original_currency CHAR(3) NOT NULL,
    original_amount NUMERIC(22, 4) NOT NULL,
    exchange_rate NUMERIC(18, 6) NOT NULL CHECK (exchange_rate > 0),
    tax_code VARCHAR(50),
    tax_amount NUMERIC(22, 4),
    tax_rate NUMERIC(5, 4) CHECK (tax_rate >= 0 AND tax_rate <= 1),
    CONSTRAINT journal_lines_number_unique UNIQUE (journal_id, line_number),
    CONSTRAINT journal_lines_single_side CHECK (
        (debit_amount > 0 AND credit_amount = 0)
        OR (credit_amount > 0 AND debit_amount = 0)
    )
);

CREATE INDEX idx_journal_lines_journal ON journal_lines (journal_id);
CREATE INDEX idx_journal_lines_org_account ON journal_lines (organization_id, account_id);
";

const IMMUTABILITY_SQL: &str = r"
-- Storage-level write restriction: drafts update freely; sealed journals
-- accept only the posted -> reversed transition with its linkage and
-- updated_at. Everything else raises.
CREATE FUNCTION journals_enforce_immutability() RETURNS trigger AS $$
BEGIN
    IF OLD.status = 'draft' THEN
        RETURN NEW;
    END IF;

    IF OLD.status = 'posted'
        AND NEW.status IN ('posted', 'reversed')
        AND NEW.id = OLD.id
        AND NEW.organization_id = OLD.organization_id
        AND NEW.period_id = OLD.period_id
        AND NEW.journal_number = OLD.journal_number
        AND NEW.description = OLD.description
        AND NEW.reference IS NOT DISTINCT FROM OLD.reference
        AND NEW.posting_date = OLD.posting_date
        AND NEW.currency = OLD.currency
        AND NEW.hash_prev IS NOT DISTINCT FROM OLD.hash_prev
        AND NEW.hash_self IS NOT DISTINCT FROM OLD.hash_self
        AND NEW.original_journal_id IS NOT DISTINCT FROM OLD.original_journal_id
        AND NEW.ext_uid IS NOT DISTINCT FROM OLD.ext_uid
        AND NEW.created_by = OLD.created_by
        AND NEW.posted_by IS NOT DISTINCT FROM OLD.posted_by
        AND NEW.posted_at IS NOT DISTINCT FROM OLD.posted_at
        AND NEW.created_at = OLD.created_at
    THEN
        RETURN NEW;
    END IF;

    RAISE EXCEPTION 'journal % is immutable once posted', OLD.id;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER journals_immutability
    BEFORE UPDATE ON journals
    FOR EACH ROW EXECUTE FUNCTION journals_enforce_immutability();

-- Lines of sealed journals never change. Inserts are exempt: the reversal
-- mirror is written already sealed, lines included. Cascade deletes of a
-- vanished parent are exempt as well.
CREATE FUNCTION journal_lines_enforce_immutability() RETURNS trigger AS $$
DECLARE
    parent_status journal_status;
BEGIN
    SELECT status INTO parent_status FROM journals WHERE id = OLD.journal_id;
    IF parent_status IS NULL OR parent_status = 'draft' THEN
        IF TG_OP = 'DELETE' THEN
            RETURN OLD;
        END IF;
        RETURN NEW;
    END IF;

    RAISE EXCEPTION 'lines of journal % are immutable once posted', OLD.journal_id;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER journal_lines_immutability
    BEFORE UPDATE OR DELETE ON journal_lines
    FOR EACH ROW EXECUTE FUNCTION journal_lines_enforce_immutability();
";

const RLS_SQL: &str = r"
-- Row-level multi-tenant isolation. Queries from a request can only ever
-- observe rows of the organization bound via SET LOCAL app.current_org_id;
-- with no binding, current_setting returns NULL and nothing is visible.
ALTER TABLE periods ENABLE ROW LEVEL SECURITY;
ALTER TABLE periods FORCE ROW LEVEL SECURITY;
CREATE POLICY periods_tenant_isolation ON periods
    USING (organization_id = current_setting('app.current_org_id', true)::uuid)
    WITH CHECK (organization_id = current_setting('app.current_org_id', true)::uuid);

ALTER TABLE journals ENABLE ROW LEVEL SECURITY;
ALTER TABLE journals FORCE ROW LEVEL SECURITY;
CREATE POLICY journals_tenant_isolation ON journals
    USING (organization_id = current_setting('app.current_org_id', true)::uuid)
    WITH CHECK (organization_id = current_setting('app.current_org_id', true)::uuid);

ALTER TABLE journal_lines ENABLE ROW LEVEL SECURITY;
ALTER TABLE journal_lines FORCE ROW LEVEL SECURITY;
CREATE POLICY journal_lines_tenant_isolation ON journal_lines
    USING (organization_id = current_setting('app.current_org_id', true)::uuid)
    WITH CHECK (organization_id = current_setting('app.current_org_id', true)::uuid);
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS journal_lines_immutability ON journal_lines;
DROP TRIGGER IF EXISTS journals_immutability ON journals;
DROP FUNCTION IF EXISTS journal_lines_enforce_immutability();
DROP FUNCTION IF EXISTS journals_enforce_immutability();
DROP TABLE IF EXISTS journal_lines;
DROP TABLE IF EXISTS journals;
DROP TABLE IF EXISTS periods;
DROP TYPE IF EXISTS journal_status;
DROP TYPE IF EXISTS period_status;
";
