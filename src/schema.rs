// courtsync schema - stat tables for Diesel ORM
//
// SQL table and column names follow the historical store layout (read by the
// static viewer), so most entries carry an explicit `sql_name`. The stat tables
// have no declared key; `id` maps onto SQLite's implicit rowid.

diesel::table! {
    #[sql_name = "Player"]
    player_season_stats (id) {
        #[sql_name = "rowid"]
        id -> Integer,
        #[sql_name = "Rk"]
        rank -> Nullable<Integer>,
        #[sql_name = "Player"]
        player -> Nullable<Text>,
        #[sql_name = "Age"]
        age -> Nullable<Integer>,
        #[sql_name = "Tm"]
        team -> Nullable<Text>,
        #[sql_name = "Pos"]
        position -> Nullable<Text>,
        #[sql_name = "G"]
        games -> Nullable<Integer>,
        #[sql_name = "GS"]
        games_started -> Nullable<Integer>,
        #[sql_name = "MP"]
        minutes -> Nullable<Double>,
        #[sql_name = "FG"]
        fg -> Nullable<Double>,
        #[sql_name = "FGA"]
        fga -> Nullable<Double>,
        #[sql_name = "FG_percent"]
        fg_pct -> Nullable<Double>,
        #[sql_name = "ThreeP"]
        three_p -> Nullable<Double>,
        #[sql_name = "ThreePA"]
        three_pa -> Nullable<Double>,
        #[sql_name = "ThreeP_percent"]
        three_p_pct -> Nullable<Double>,
        #[sql_name = "TwoP"]
        two_p -> Nullable<Double>,
        #[sql_name = "TwoPA"]
        two_pa -> Nullable<Double>,
        #[sql_name = "TwoP_percent"]
        two_p_pct -> Nullable<Double>,
        #[sql_name = "eFG_percent"]
        efg_pct -> Nullable<Double>,
        #[sql_name = "FT"]
        ft -> Nullable<Double>,
        #[sql_name = "FTA"]
        fta -> Nullable<Double>,
        #[sql_name = "FT_percent"]
        ft_pct -> Nullable<Double>,
        #[sql_name = "ORB"]
        orb -> Nullable<Double>,
        #[sql_name = "DRB"]
        drb -> Nullable<Double>,
        #[sql_name = "TRB"]
        trb -> Nullable<Double>,
        #[sql_name = "AST"]
        ast -> Nullable<Double>,
        #[sql_name = "STL"]
        stl -> Nullable<Double>,
        #[sql_name = "BLK"]
        blk -> Nullable<Double>,
        #[sql_name = "TOV"]
        tov -> Nullable<Double>,
        #[sql_name = "PF"]
        pf -> Nullable<Double>,
        #[sql_name = "PTS"]
        pts -> Nullable<Double>,
    }
}

diesel::table! {
    #[sql_name = "Schedule"]
    schedule (id) {
        #[sql_name = "rowid"]
        id -> Integer,
        #[sql_name = "Date"]
        game_date -> Nullable<Text>,
        #[sql_name = "Start_Time"]
        start_time -> Nullable<Text>,
        #[sql_name = "Visitor"]
        visitor -> Nullable<Text>,
        #[sql_name = "Visitor_PTS"]
        visitor_pts -> Nullable<Integer>,
        #[sql_name = "Home"]
        home -> Nullable<Text>,
        #[sql_name = "Home_PTS"]
        home_pts -> Nullable<Integer>,
        #[sql_name = "BoxScore"]
        box_score -> Nullable<Text>,
        #[sql_name = "Notes"]
        notes -> Nullable<Text>,
        #[sql_name = "Attendance"]
        attendance -> Nullable<Integer>,
        #[sql_name = "LengthOfGame"]
        length_of_game -> Nullable<Text>,
        #[sql_name = "Arena"]
        arena -> Nullable<Text>,
        #[sql_name = "Last_Updated"]
        last_updated -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "PlaybyPlay"]
    play_by_play (id) {
        #[sql_name = "rowid"]
        id -> Integer,
        #[sql_name = "Game_ID"]
        game_id -> Text,
        #[sql_name = "Quarter"]
        quarter -> Text,
        #[sql_name = "Time"]
        clock -> Text,
        #[sql_name = "Visitor_Action"]
        visitor_action -> Text,
        #[sql_name = "Visitor_PTS"]
        visitor_pts -> Nullable<Integer>,
        #[sql_name = "Score"]
        score -> Text,
        #[sql_name = "Home_PTS"]
        home_pts -> Nullable<Integer>,
        #[sql_name = "Home_Action"]
        home_action -> Text,
    }
}

diesel::table! {
    #[sql_name = "BoxScoreBasic"]
    box_score_basic (id) {
        #[sql_name = "rowid"]
        id -> Integer,
        #[sql_name = "Game_ID"]
        game_id -> Text,
        #[sql_name = "Team"]
        team -> Text,
        #[sql_name = "Opponent"]
        opponent -> Text,
        #[sql_name = "Game_Type"]
        game_type -> Text,
        #[sql_name = "Period"]
        period -> Text,
        #[sql_name = "Player"]
        player -> Text,
        #[sql_name = "Status"]
        status -> Text,
        #[sql_name = "MP"]
        minutes -> Nullable<Text>,
        #[sql_name = "FG"]
        fg -> Nullable<Integer>,
        #[sql_name = "FGA"]
        fga -> Nullable<Integer>,
        #[sql_name = "FG_percent"]
        fg_pct -> Nullable<Double>,
        #[sql_name = "ThreeP"]
        three_p -> Nullable<Integer>,
        #[sql_name = "ThreePA"]
        three_pa -> Nullable<Integer>,
        #[sql_name = "ThreeP_percent"]
        three_p_pct -> Nullable<Double>,
        #[sql_name = "FT"]
        ft -> Nullable<Integer>,
        #[sql_name = "FTA"]
        fta -> Nullable<Integer>,
        #[sql_name = "FT_percent"]
        ft_pct -> Nullable<Double>,
        #[sql_name = "ORB"]
        orb -> Nullable<Integer>,
        #[sql_name = "DRB"]
        drb -> Nullable<Integer>,
        #[sql_name = "TRB"]
        trb -> Nullable<Integer>,
        #[sql_name = "AST"]
        ast -> Nullable<Integer>,
        #[sql_name = "STL"]
        stl -> Nullable<Integer>,
        #[sql_name = "BLK"]
        blk -> Nullable<Integer>,
        #[sql_name = "TOV"]
        tov -> Nullable<Integer>,
        #[sql_name = "PF"]
        pf -> Nullable<Integer>,
        #[sql_name = "PTS"]
        pts -> Nullable<Integer>,
        #[sql_name = "GmSc"]
        game_score -> Nullable<Double>,
        #[sql_name = "PlusMinus"]
        plus_minus -> Nullable<Integer>,
    }
}

diesel::table! {
    #[sql_name = "BoxScoreAdvanced"]
    box_score_advanced (id) {
        #[sql_name = "rowid"]
        id -> Integer,
        #[sql_name = "Game_ID"]
        game_id -> Text,
        #[sql_name = "Team"]
        team -> Text,
        #[sql_name = "Opponent"]
        opponent -> Text,
        #[sql_name = "Game_Type"]
        game_type -> Text,
        #[sql_name = "Period"]
        period -> Text,
        #[sql_name = "Player"]
        player -> Text,
        #[sql_name = "Status"]
        status -> Text,
        #[sql_name = "MP"]
        minutes -> Nullable<Text>,
        #[sql_name = "TS_percent"]
        ts_pct -> Nullable<Double>,
        #[sql_name = "eFG_percent"]
        efg_pct -> Nullable<Double>,
        #[sql_name = "ThreePAr"]
        three_par -> Nullable<Double>,
        #[sql_name = "FTr"]
        ftr -> Nullable<Double>,
        #[sql_name = "ORB_percent"]
        orb_pct -> Nullable<Double>,
        #[sql_name = "DRB_percent"]
        drb_pct -> Nullable<Double>,
        #[sql_name = "TRB_percent"]
        trb_pct -> Nullable<Double>,
        #[sql_name = "AST_percent"]
        ast_pct -> Nullable<Double>,
        #[sql_name = "STL_percent"]
        stl_pct -> Nullable<Double>,
        #[sql_name = "BLK_percent"]
        blk_pct -> Nullable<Double>,
        #[sql_name = "TOV_percent"]
        tov_pct -> Nullable<Double>,
        #[sql_name = "USG_percent"]
        usg_pct -> Nullable<Double>,
        #[sql_name = "ORtg"]
        off_rating -> Nullable<Integer>,
        #[sql_name = "DRtg"]
        def_rating -> Nullable<Integer>,
        #[sql_name = "BPM"]
        bpm -> Nullable<Double>,
    }
}

// ============================================================================
// Run ledger
// ============================================================================

diesel::table! {
    sync_runs (id) {
        id -> Integer,
        run_id -> Text,                  // UUID v4
        started_at -> Text,
        completed_at -> Nullable<Text>,
        status -> Text,                  // 'running', 'completed', 'failed'
        games_pending -> Integer,
        games_synced -> Integer,
        games_failed -> Integer,
        error -> Nullable<Text>,
    }
}
