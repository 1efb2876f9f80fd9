/// 요구사항 컬럼
const REQUIREMENT_COLUMNS: &str = "id, product_name, hs_code, moq, description, images, created_by, start_time, end_time, status, created_at";

/// 요구사항 등록
pub const INSERT_REQUIREMENT: &str = r#"
    INSERT INTO requirements
        (id, product_name, hs_code, moq, description, images, created_by, start_time, end_time, status, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
"#;

/// 요구사항 조회
pub fn get_requirement() -> String {
    format!("SELECT {REQUIREMENT_COLUMNS} FROM requirements WHERE id = $1")
}

/// 모든 요구사항 조회
pub fn get_all_requirements() -> String {
    format!("SELECT {REQUIREMENT_COLUMNS} FROM requirements ORDER BY created_at DESC")
}

/// 입찰 전 요구사항 행 잠금
pub const LOCK_REQUIREMENT: &str = "SELECT id FROM requirements WHERE id = $1 FOR UPDATE";

/// 요구사항 삭제
pub const DELETE_REQUIREMENT: &str = "DELETE FROM requirements WHERE id = $1";

/// 요구사항 입찰 전체 삭제
pub const DELETE_REQUIREMENT_BIDS: &str = "DELETE FROM bids WHERE requirement_id = $1";

/// 요구사항 입찰 조회 (금액 오름차순)
pub const GET_REQUIREMENT_BIDS: &str = r#"
    SELECT id, requirement_id, supplier_id, supplier_name, amount, created_at
    FROM bids
    WHERE requirement_id = $1
    ORDER BY amount ASC, created_at ASC, id ASC
"#;

/// 최저 입찰 조회
pub const GET_LOWEST_BID: &str = r#"
    SELECT id, requirement_id, supplier_id, supplier_name, amount, created_at
    FROM bids
    WHERE requirement_id = $1
    ORDER BY amount ASC, created_at ASC, id ASC
    LIMIT 1
"#;

/// 입찰 등록
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (id, requirement_id, supplier_id, supplier_name, amount, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// 표시용 상태 갱신
pub const REFRESH_STATUSES: &str = r#"
    UPDATE requirements
    SET status = CASE
        WHEN $1 < start_time THEN 'upcoming'
        WHEN $1 > end_time THEN 'closed'
        ELSE 'open'
    END
    WHERE status <> CASE
        WHEN $1 < start_time THEN 'upcoming'
        WHEN $1 > end_time THEN 'closed'
        ELSE 'open'
    END
"#;
