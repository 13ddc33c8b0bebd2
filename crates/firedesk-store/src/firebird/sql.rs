// ── Statements and row decoding ──
//
// Column order in each SELECT is load-bearing: the decoders below read
// by position.

use rsfbclient::{FbError, Row};

use crate::rows::{
    AlarmRow, ContactRow, EventRow, ObjectDetailRow, ObjectRow, TestControlRow, TestMessageRow,
    ZoneRow,
};

pub(crate) const PING: &str = "SELECT 1 FROM RDB$DATABASE";

pub(crate) const OBJECTS: &str = "
    SELECT
        oi.OBJUIN, oi.OBJN, oi.OBJFULLNAME1, oi.OBJSHORTNAME1, oi.ADDRESS1, oi.CONTRACT1,
        oi.GSMPHONE, oi.GSMPHONE2,
        os.ALARMSTATE1, os.GUARDSTATE1, os.TECHALARMSTATE1,
        ol.ISCONNSTATE1
    FROM OBJECTS_INFO oi
    JOIN OBJECTS_LA ol ON ol.OBJN = oi.OBJN
    JOIN OBJECTS_STATE os ON os.OBJN = oi.OBJN
    WHERE oi.OBJTYPEID <> 1
    ORDER BY oi.OBJN";

pub(crate) const OBJECT_DETAIL: &str = "
    SELECT
        oi.OBJUIN, oi.OBJN, oi.OBJFULLNAME1, oi.OBJSHORTNAME1, oi.ADDRESS1, oi.CONTRACT1,
        oi.PHONES1, oi.NOTES1, oi.RESERVTEXT, oi.GSMPHONE, oi.GSMPHONE2, oi.LOCATION1,
        ot.OBJTYPE1,
        os.ALARMSTATE1, os.GUARDSTATE1, os.TECHALARMSTATE1,
        ol.ISCONNSTATE1,
        os.AKBSTATE, os.TESTCONTROL1, os.TESTTIME1, os.POWERFAULT,
        oi.OBJCHAN,
        p.PANELMARK1
    FROM OBJECTS_INFO oi
    LEFT JOIN OBJTYPES ot ON ot.ID = oi.OBJTYPEID
    LEFT JOIN OBJECTS_STATE os ON os.OBJUIN = oi.OBJUIN
    LEFT JOIN OBJECTS_LA ol ON ol.OBJUIN = oi.OBJUIN
    LEFT JOIN PPK p ON oi.PPKID = p.ID + 100
    WHERE oi.OBJN = ?";

pub(crate) const ZONES: &str = "
    SELECT ID, ZONEN, ZONEDESCR1, ZONETYPE1, ALARMSTATE1, TECHALARMSTATE1
    FROM ZONES
    WHERE OBJN = ?
    ORDER BY ZONEN";

pub(crate) const CONTACTS: &str = "
    SELECT ID, SURNAME1, NAME1, SECNAME1, ADDRESS1, PHONES1, STATUS1, ORDER1
    FROM PERSONAL
    WHERE OBJUIN = (SELECT FIRST 1 OBJUIN FROM OBJECTS_INFO WHERE OBJN = ?)
    ORDER BY ORDER1";

pub(crate) const ACTIVE_ALARMS: &str = "
    SELECT a.EVTIME1, a.OBJN, a.OBJSHORTNAME1, oi.ADDRESS1, a.ZONEN, a.INFO1, m.UKR1, m.SC1
    FROM ACTALARMS a
    JOIN MESSLIST m ON m.UIN = a.EVUIN
    JOIN OBJECTS_INFO oi ON a.OBJN = oi.OBJN";

pub(crate) const LAST_EVENT_ID: &str = "SELECT FIRST 1 ID FROM EVLOG ORDER BY ID DESC";

/// Incremental fetch. The limit is spliced in as a literal because
/// Firebird does not accept a parameter in `ROWS`.
pub(crate) fn events_since(limit: usize) -> String {
    format!(
        "
    SELECT e.ID, e.EVTIME1, oi.OBJSHORTNAME1, oi.OBJN, e.ZONEN, m.UKR1, e.INFO1, m.SC1, oi.OBJCHAN
    FROM (
        SELECT ID, EVTIME1, OBJUIN, EVUIN, ZONEN, INFO1
        FROM EVLOG
        WHERE ID > ?
        ORDER BY ID
        ROWS {limit}
    ) e
    JOIN OBJECTS_INFO oi ON oi.OBJUIN = e.OBJUIN
    JOIN MESSLIST m ON m.UIN = e.EVUIN
    WHERE EXISTS (SELECT 1 FROM OBJECTS_STATE os WHERE os.OBJUIN = oi.OBJUIN)
    ORDER BY e.ID"
    )
}

pub(crate) const OBJECT_EVENTS: &str = "
    SELECT FIRST 500 e.ID, e.EVTIME1, oi.OBJSHORTNAME1, oi.OBJN, e.ZONEN, m.UKR1, e.INFO1, m.SC1, oi.OBJCHAN
    FROM EVLOG e
    JOIN OBJECTS_INFO oi ON oi.OBJUIN = e.OBJUIN
    JOIN MESSLIST m ON m.UIN = e.EVUIN
    WHERE oi.OBJN = ?
    ORDER BY e.ID DESC";

pub(crate) const EXTERNAL_PATH: &str = "
    SELECT sb.SBPDB, sb.SBTYPE
    FROM OBJECTS_INFO oi
    JOIN SBS sb ON TRIM(oi.SBSA) = TRIM(sb.SBIND)
    WHERE oi.OBJN = ?";

pub(crate) const TEST_MESSAGES: &str = "
    SELECT t.MSGDTIME1, t.MSGINFO, t.MSGTEXT
    FROM TRPMSG t
    WHERE t.OBJN = ?
    ORDER BY t.MSGDTIME1 DESC";

pub(crate) const TEST_CONTROL: &str = "
    SELECT tt.ISCONNSTATE, tt.LASTTESTTIME1, tt.LASTMESSTIME1
    FROM TBL_TESTCONTROL tt
    WHERE tt.OBJN = ?";

// ── Decoders ─────────────────────────────────────────────────────────

pub(crate) fn object_row(row: &Row) -> Result<ObjectRow, FbError> {
    Ok(ObjectRow {
        uin: row.get(0)?,
        number: row.get(1)?,
        full_name: row.get(2)?,
        short_name: row.get(3)?,
        address: row.get(4)?,
        contract: row.get(5)?,
        gsm_phone: row.get(6)?,
        gsm_phone2: row.get(7)?,
        alarm_state: row.get(8)?,
        guard_state: row.get(9)?,
        tech_alarm_state: row.get(10)?,
        conn_state: row.get(11)?,
    })
}

pub(crate) fn object_detail_row(row: &Row) -> Result<ObjectDetailRow, FbError> {
    Ok(ObjectDetailRow {
        uin: row.get(0)?,
        number: row.get(1)?,
        full_name: row.get(2)?,
        short_name: row.get(3)?,
        address: row.get(4)?,
        contract: row.get(5)?,
        phones: row.get(6)?,
        notes: row.get(7)?,
        reserve_text: row.get(8)?,
        gsm_phone: row.get(9)?,
        gsm_phone2: row.get(10)?,
        location: row.get(11)?,
        object_type: row.get(12)?,
        alarm_state: row.get(13)?,
        guard_state: row.get(14)?,
        tech_alarm_state: row.get(15)?,
        conn_state: row.get(16)?,
        battery_state: row.get(17)?,
        test_control: row.get(18)?,
        test_time: row.get(19)?,
        power_fault: row.get(20)?,
        channel: row.get(21)?,
        panel_mark: row.get(22)?,
    })
}

pub(crate) fn zone_row(row: &Row) -> Result<ZoneRow, FbError> {
    Ok(ZoneRow {
        id: row.get(0)?,
        number: row.get(1)?,
        description: row.get(2)?,
        zone_type: row.get(3)?,
        alarm_state: row.get(4)?,
        tech_alarm_state: row.get(5)?,
    })
}

pub(crate) fn contact_row(row: &Row) -> Result<ContactRow, FbError> {
    Ok(ContactRow {
        id: row.get(0)?,
        surname: row.get(1)?,
        name: row.get(2)?,
        second_name: row.get(3)?,
        address: row.get(4)?,
        phones: row.get(5)?,
        position: row.get(6)?,
        order: row.get(7)?,
    })
}

pub(crate) fn alarm_row(row: &Row) -> Result<AlarmRow, FbError> {
    Ok(AlarmRow {
        time: row.get(0)?,
        object_number: row.get(1)?,
        short_name: row.get(2)?,
        address: row.get(3)?,
        zone: row.get(4)?,
        info: row.get(5)?,
        message: row.get(6)?,
        code: row.get(7)?,
    })
}

pub(crate) fn event_row(row: &Row) -> Result<EventRow, FbError> {
    Ok(EventRow {
        id: row.get(0)?,
        time: row.get(1)?,
        short_name: row.get(2)?,
        object_number: row.get(3)?,
        zone: row.get(4)?,
        message: row.get(5)?,
        info: row.get(6)?,
        code: row.get(7)?,
        channel: row.get(8)?,
    })
}

pub(crate) fn test_message_row(row: &Row) -> Result<TestMessageRow, FbError> {
    Ok(TestMessageRow {
        time: row.get(0)?,
        info: row.get(1)?,
        text: row.get(2)?,
    })
}

pub(crate) fn test_control_row(row: &Row) -> Result<TestControlRow, FbError> {
    Ok(TestControlRow {
        conn_state: row.get(0)?,
        last_test: row.get(1)?,
        last_message: row.get(2)?,
    })
}

pub(crate) fn decode_all<T>(
    rows: &[Row],
    decode: fn(&Row) -> Result<T, FbError>,
) -> Result<Vec<T>, FbError> {
    rows.iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_since_splices_limit() {
        let sql = events_since(2000);
        assert!(sql.contains("ROWS 2000"));
        assert!(sql.contains("WHERE ID > ?"));
        assert!(sql.trim_end().ends_with("ORDER BY e.ID"));
    }
}
